use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use leafmap_core::classify::FeasibilityResponse;
use leafmap_core::config::LayeredConfig;
use leafmap_core::error::{LeafError, Result};
use leafmap_core::models::{GpLocation, Level, LevelsInfo, LocationListing, VariableDescriptor};
use leafmap_core::ports::{
    ExportRequest, FeasibilityRequest, GpBlockListing, Recommendation, RecommendationRequest, ScoringService,
};

/// Scoring service reached over HTTP
pub struct HttpScoringClient {
    /// Base URL including the API prefix (e.g., "http://localhost:5000/api")
    base_url: String,

    client: reqwest::Client,
}

impl HttpScoringClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), client: reqwest::Client::new() }
    }

    /// Create with the configured scoring URL
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self::new(config.scoring_url.value.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        tracing::debug!(path, "GET scoring service");
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;
        decode(path, response).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        tracing::debug!(path, "POST scoring service");
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;
        decode(path, response).await
    }
}

fn transport_error(path: &str, e: reqwest::Error) -> LeafError {
    LeafError::Transport {
        endpoint: path.to_string(),
        reason: format!("Failed to connect to scoring service: {}", e),
    }
}

/// Map a non-success status to a backend error carrying the server's message
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body).map(|b| b.error).unwrap_or(body);
    Err(LeafError::Backend { status: status.as_u16(), message })
}

async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> Result<T> {
    let response = check_status(response).await?;
    response.json().await.map_err(|e| {
        LeafError::Serialization(format!("Failed to parse response of {}: {}", path, e))
    })
}

fn segment(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn locations(&self) -> Result<LocationListing> {
        self.get_json("/locations").await
    }

    async fn levels(&self) -> Result<LevelsInfo> {
        self.get_json("/levels").await
    }

    async fn gp_locations(&self) -> Result<Vec<GpLocation>> {
        let envelope: GpLocationsEnvelope = self.get_json("/gp/locations").await?;
        Ok(envelope.gps)
    }

    async fn interventions(&self) -> Result<BTreeMap<String, JsonValue>> {
        let envelope: InterventionsEnvelope = self.get_json("/interventions").await?;
        Ok(envelope
            .interventions
            .into_iter()
            .filter_map(|entry| {
                let key = entry.get("key").or_else(|| entry.get("name"))?.as_str()?.to_string();
                Some((key, entry))
            })
            .collect())
    }

    async fn intervention_config(&self, name: &str) -> Result<JsonValue> {
        self.get_json(&format!("/intervention/{}/config", segment(name))).await
    }

    async fn variables(&self, level: Level) -> Result<Vec<VariableDescriptor>> {
        match level {
            Level::Block => self.get_json("/variables").await,
            Level::Gp => self.get_json("/gp/variables").await,
        }
    }

    async fn feature_layer(&self, level: Level) -> Result<geojson::FeatureCollection> {
        match level {
            Level::Block => self.get_json("/blocks/geojson").await,
            Level::Gp => self.get_json("/gp/geojson").await,
        }
    }

    async fn gp_block(&self, block: &str) -> Result<GpBlockListing> {
        self.get_json(&format!("/gp/block/{}", segment(block))).await
    }

    async fn calculate_feasibility(
        &self,
        level: Level,
        request: &FeasibilityRequest,
    ) -> Result<FeasibilityResponse> {
        match level {
            Level::Block => self.post_json("/calculate-feasibility", request).await,
            Level::Gp => self.post_json("/gp/calculate-feasibility", request).await,
        }
    }

    async fn export_csv(&self, request: &ExportRequest) -> Result<Vec<u8>> {
        let path = "/export/csv";
        let response = self
            .client
            .post(self.url(path))
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(path, e))?;
        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| transport_error(path, e))?;
        Ok(bytes.to_vec())
    }

    async fn recommendation(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        self.post_json("/ai-recommendation", &WireRecommendationRequest::from(request)).await
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
struct GpLocationsEnvelope {
    #[serde(default)]
    gps: Vec<GpLocation>,
}

#[derive(Debug, Deserialize)]
struct InterventionsEnvelope {
    #[serde(default)]
    interventions: Vec<JsonValue>,
}

/// Body of `POST /ai-recommendation`
#[derive(Debug, Serialize)]
struct WireRecommendationRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    intervention: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    district_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    block_name: Option<&'a str>,
    filters: &'a [leafmap_core::models::Filter],
}

impl<'a> From<&'a RecommendationRequest> for WireRecommendationRequest<'a> {
    fn from(request: &'a RecommendationRequest) -> Self {
        Self {
            intervention: request.intervention.as_deref(),
            district_name: request.district.as_deref(),
            block_name: request.block.as_deref(),
            filters: &request.filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpScoringClient::from_config(&LayeredConfig::with_defaults());
        assert_eq!(client.base_url(), "http://localhost:5000/api");
        assert_eq!(client.url("/levels"), "http://localhost:5000/api/levels");
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(segment("Organic Farming"), "Organic%20Farming");
        assert_eq!(segment("A/B"), "A%2FB");
    }

    #[test]
    fn test_recommendation_wire_names() {
        let request = RecommendationRequest {
            intervention: Some("Farm Ponds".into()),
            district: Some("Tinsukia".into()),
            block: None,
            filters: Vec::new(),
        };
        let body = serde_json::to_value(WireRecommendationRequest::from(&request)).unwrap();
        assert_eq!(body["district_name"], "Tinsukia");
        assert!(body.get("block_name").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let client = HttpScoringClient::new("http://127.0.0.1:9");
        let err = client.levels().await.unwrap_err();
        assert!(matches!(err, LeafError::Transport { .. }));
        assert!(err.is_remote());
    }
}
