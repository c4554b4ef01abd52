use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "leafmap-api" }
    }
}

/// Read-only caches shared by every session
#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub districts: Vec<String>,
    pub gp_districts: Vec<String>,
    pub interventions: Vec<String>,
    pub block_variables: usize,
    pub gp_variables: usize,
}
