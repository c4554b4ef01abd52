use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Session replay
        .route("/api/catalog", get(handlers::get_catalog))
        .route("/api/view", post(handlers::post_view))
        .route("/api/export/csv", post(handlers::export_csv))
        .route("/api/recommendation", post(handlers::recommendation))

        // Shareable dashboard paths
        .route("/", get(handlers::get_root_view))
        .route("/{district}", get(handlers::get_district_view))
        .route("/{district}/{block}", get(handlers::get_block_view))
        .route("/{district}/{block}/{gp}", get(handlers::get_gp_view))

        .with_state(state)
}
