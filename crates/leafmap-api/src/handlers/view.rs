use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use leafmap_core::presenter::ViewModel;
use leafmap_core::url::ViewPath;

use crate::dto::ViewRequest;
use crate::error::ApiError;
use crate::state::AppState;

async fn render(state: &AppState, target: ViewPath) -> Result<Json<ViewModel>, ApiError> {
    let path = target.to_path();
    tracing::info!(path = %path, "Rendering dashboard view");
    let session = state.replay(&path, Vec::new()).await?;
    Ok(Json(session.view_model()))
}

pub async fn get_root_view(State(state): State<Arc<AppState>>) -> Result<Json<ViewModel>, ApiError> {
    render(&state, ViewPath::default()).await
}

pub async fn get_district_view(
    State(state): State<Arc<AppState>>,
    Path(district): Path<String>,
) -> Result<Json<ViewModel>, ApiError> {
    render(&state, ViewPath { district, ..Default::default() }).await
}

pub async fn get_block_view(
    State(state): State<Arc<AppState>>,
    Path((district, block)): Path<(String, String)>,
) -> Result<Json<ViewModel>, ApiError> {
    render(&state, ViewPath { district, block, gp: String::new() }).await
}

pub async fn get_gp_view(
    State(state): State<Arc<AppState>>,
    Path((district, block, gp)): Path<(String, String, String)>,
) -> Result<Json<ViewModel>, ApiError> {
    render(&state, ViewPath { district, block, gp }).await
}

/// Replay a path and a list of actions, returning the resulting view
pub async fn post_view(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ViewRequest>,
) -> Result<Json<ViewModel>, ApiError> {
    tracing::info!(path = %request.path, actions = request.actions.len(), "Replaying dashboard actions");
    let session = state.replay(&request.path, request.actions).await?;
    Ok(Json(session.view_model()))
}
