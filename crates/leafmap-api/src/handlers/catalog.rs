use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::CatalogResponse;
use crate::state::AppState;

pub async fn get_catalog(State(state): State<Arc<AppState>>) -> Json<CatalogResponse> {
    let catalog = &state.catalog;
    let districts: Vec<String> = catalog.hierarchy.districts().iter().map(|d| d.name.clone()).collect();
    let gp_districts = districts.iter().filter(|d| catalog.hierarchy.supports_gp(d)).cloned().collect();

    Json(CatalogResponse {
        districts,
        gp_districts,
        interventions: catalog.interventions.clone(),
        block_variables: catalog.block_variables.len(),
        gp_variables: catalog.gp_variables.len(),
    })
}
