use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::classify::FeasibilityResponse;
use crate::error::Result;
use crate::models::{
    Filter, FilterLogic, GpLocation, Level, LevelsInfo, LocationListing, VariableDescriptor,
};

/// Body of the feasibility calculation endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<String>,
    pub filters: Vec<Filter>,
    pub logic: FilterLogic,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<String>,
    pub filters: Vec<Filter>,
    pub logic: FilterLogic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervention: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,
    pub filters: Vec<Filter>,
}

/// Answer of the recommendation pipeline, passed through untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub recommendation: String,
    #[serde(default)]
    pub sources: Vec<JsonValue>,
    #[serde(default)]
    pub retrieved_context: Vec<JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpSummary {
    pub name: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub village_count: u64,
}

/// Response of `GET /gp/block/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpBlockListing {
    pub block: String,
    pub district: String,
    pub gps: Vec<GpSummary>,
}

/// Port for the remote scoring collaborator
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// `GET /locations`
    async fn locations(&self) -> Result<LocationListing>;

    /// `GET /levels`
    async fn levels(&self) -> Result<LevelsInfo>;

    /// `GET /gp/locations`
    async fn gp_locations(&self) -> Result<Vec<GpLocation>>;

    /// `GET /interventions`, keyed by intervention name
    async fn interventions(&self) -> Result<BTreeMap<String, JsonValue>>;

    /// `GET /intervention/{name}/config`, returned raw so malformed configs can be tolerated
    async fn intervention_config(&self, name: &str) -> Result<JsonValue>;

    /// `GET /variables` or `GET /gp/variables`
    async fn variables(&self, level: Level) -> Result<Vec<VariableDescriptor>>;

    /// `GET /blocks/geojson` or `GET /gp/geojson`
    async fn feature_layer(&self, level: Level) -> Result<geojson::FeatureCollection>;

    /// `GET /gp/block/{name}`
    async fn gp_block(&self, block: &str) -> Result<GpBlockListing>;

    /// `POST /calculate-feasibility` or `POST /gp/calculate-feasibility`
    async fn calculate_feasibility(
        &self,
        level: Level,
        request: &FeasibilityRequest,
    ) -> Result<FeasibilityResponse>;

    /// `POST /export/csv`
    async fn export_csv(&self, request: &ExportRequest) -> Result<Vec<u8>>;

    /// `POST /ai-recommendation`
    async fn recommendation(&self, request: &RecommendationRequest) -> Result<Recommendation>;
}
