use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use leafmap_core::ports::Recommendation;

use crate::dto::ViewRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// CSV of the feasibility results for the replayed filter set
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewRequest>,
) -> Result<Response, ApiError> {
    let session = state.replay(&request.path, request.actions).await?;
    let bytes = session.export_csv().await.map_err(|e| {
        tracing::error!(error = %e, "CSV export failed");
        ApiError::from(e)
    })?;

    let filename = match session.store().intervention() {
        Some(name) => format!("feasibility_{}.csv", name.replace(|c: char| !c.is_ascii_alphanumeric(), "_")),
        None => "feasibility.csv".to_string(),
    };

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
        ],
        bytes,
    )
        .into_response())
}

pub async fn recommendation(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewRequest>,
) -> Result<Json<Recommendation>, ApiError> {
    let session = state.replay(&request.path, request.actions).await?;
    let recommendation = session.recommendation().await?;
    Ok(Json(recommendation))
}
