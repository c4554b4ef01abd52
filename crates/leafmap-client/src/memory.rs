//! In-memory scoring service for development and testing.
//!
//! Scores features with the weighted-match rule: each filter whose column has
//! a numeric value contributes its weight to the applicable total, and to the
//! matched total when the value lies inside `[min_val, max_val]`. The score is
//! `matched / applicable * 100`, or no data when nothing applies.

use async_trait::async_trait;
use geojson::{Feature, FeatureCollection};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use leafmap_core::classify::{FeasibilityResponse, WireStatistics};
use leafmap_core::error::{LeafError, Result};
use leafmap_core::models::feature::{parse_numeric, property_text};
use leafmap_core::models::{
    BlockRow, DistributionBucket, FeasibilityLabel, FeasibilityStatistics, Filter, GpLocation, InterventionConfig,
    LayerSchema, Level, LevelInfo, LevelsInfo, LocationListing, VariableDescriptor,
};
use leafmap_core::ports::{
    ExportRequest, FeasibilityRequest, GpBlockListing, GpSummary, Recommendation, RecommendationRequest,
    ScoringService,
};

/// Property keys that identify a feature rather than describe it
const IDENTITY_KEYS: [&str; 12] = [
    "BLOCK_ID", "STATE_ID", "DISTRICT_I", "Block_name", "Block_Name", "Dist_Name", "GP_CODE", "GP_ID", "GP_NAME",
    "VIL_COUNT", "NUMBER OF VILLAGE", "id",
];

/// Properties written by the scorer
const SCORE_KEYS: [&str; 4] = ["feasibility", "feasibility_class", "feasibility_label", "feasibility_color"];

#[derive(Debug, Clone)]
pub struct MemoryScoringService {
    blocks: FeatureCollection,
    gps: Option<FeatureCollection>,
    interventions: BTreeMap<String, InterventionConfig>,
    /// Field -> (label, group)
    metadata: BTreeMap<String, (String, String)>,
}

impl MemoryScoringService {
    pub fn new(blocks: FeatureCollection) -> Self {
        Self { blocks, gps: None, interventions: BTreeMap::new(), metadata: BTreeMap::new() }
    }

    pub fn with_gp_layer(mut self, gps: FeatureCollection) -> Self {
        self.gps = Some(gps);
        self
    }

    pub fn with_intervention(mut self, config: InterventionConfig) -> Self {
        self.interventions.insert(config.name.clone(), config);
        self
    }

    pub fn with_metadata(mut self, field: impl Into<String>, label: impl Into<String>, group: impl Into<String>) -> Self {
        self.metadata.insert(field.into(), (label.into(), group.into()));
        self
    }

    /// Load `blocks.geojson`, and optionally `gp.geojson` and `interventions.json`, from a directory
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let blocks = read_collection(&dir.join("blocks.geojson"))?;
        let mut service = Self::new(blocks);

        let gp_path = dir.join("gp.geojson");
        if gp_path.exists() {
            service = service.with_gp_layer(read_collection(&gp_path)?);
        }

        let interventions_path = dir.join("interventions.json");
        if interventions_path.exists() {
            let content = fs::read_to_string(&interventions_path)?;
            let configs: Vec<InterventionConfig> = serde_json::from_str(&content)?;
            for config in configs {
                service = service.with_intervention(config);
            }
        }

        tracing::info!(
            dir = %dir.display(),
            blocks = service.blocks.features.len(),
            gps = service.gps.as_ref().map_or(0, |g| g.features.len()),
            interventions = service.interventions.len(),
            "Loaded in-memory scoring data"
        );
        Ok(service)
    }

    fn layer(&self, level: Level) -> Result<&FeatureCollection> {
        match level {
            Level::Block => Ok(&self.blocks),
            Level::Gp => self.gps.as_ref().ok_or_else(gp_unavailable),
        }
    }

    fn gp_districts(&self) -> Vec<String> {
        let schema = LayerSchema::gp();
        let names: BTreeSet<String> = self
            .gps
            .iter()
            .flat_map(|c| c.features.iter())
            .filter_map(|f| text(f, &schema.district_key))
            .collect();
        names.into_iter().collect()
    }
}

fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn gp_unavailable() -> LeafError {
    LeafError::Backend { status: 404, message: "GP data not available".to_string() }
}

fn text(feature: &Feature, key: &str) -> Option<String> {
    property_text(feature.properties.as_ref()?, key)
}

fn numeric(feature: &Feature, key: &str) -> Option<f64> {
    feature.properties.as_ref()?.get(key).and_then(parse_numeric)
}

/// Weighted-match score in `[0, 100]`; `None` when no filter applies
pub fn score_feature(feature: &Feature, filters: &[Filter]) -> Option<f64> {
    let (matched, applicable) = filters.iter().fold((0.0, 0.0), |(matched, applicable), filter| {
        match numeric(feature, &filter.column) {
            Some(value) => {
                let hit = if value >= filter.min_val && value <= filter.max_val { filter.weight } else { 0.0 };
                (matched + hit, applicable + filter.weight)
            }
            None => (matched, applicable),
        }
    });
    if applicable > 0.0 {
        Some(matched / applicable * 100.0)
    } else {
        None
    }
}

/// Score every feature of a collection and write the feasibility properties
pub fn score_collection(collection: &FeatureCollection, filters: &[Filter]) -> (FeatureCollection, Vec<Option<f64>>) {
    let mut scored = collection.clone();
    let mut scores = Vec::with_capacity(scored.features.len());
    for feature in &mut scored.features {
        let score = score_feature(feature, filters);
        let label = FeasibilityLabel::from_score(score);
        let properties = feature.properties.get_or_insert_with(Map::new);
        properties.insert("feasibility".into(), score.map_or(JsonValue::Null, |s| json!(s)));
        properties.insert("feasibility_class".into(), json!(label.key()));
        properties.insert("feasibility_label".into(), json!(label.bucket().display()));
        properties.insert("feasibility_color".into(), json!(label.color()));
        scores.push(score);
    }
    (scored, scores)
}

fn statistics(scores: &[Option<f64>]) -> WireStatistics {
    let mut valid: Vec<f64> = scores.iter().flatten().copied().collect();
    valid.sort_by(|a, b| a.total_cmp(b));

    let mut distribution: BTreeMap<String, u64> =
        DistributionBucket::ALL.iter().map(|b| (b.display().to_string(), 0)).collect();
    for score in scores {
        let bucket = FeasibilityLabel::from_score(*score).bucket();
        *distribution.entry(bucket.display().to_string()).or_default() += 1;
    }

    let count = valid.len();
    let (mean, median, min, max) = if count == 0 {
        (0.0, 0.0, 0.0, 100.0)
    } else {
        let mean = valid.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            valid[count / 2]
        } else {
            (valid[count / 2 - 1] + valid[count / 2]) / 2.0
        };
        (mean, median, valid[0], valid[count - 1])
    };

    WireStatistics {
        distribution: Some(distribution),
        summary: FeasibilityStatistics {
            total_blocks: Some(scores.len() as u64),
            blocks_with_data: Some(count as u64),
            blocks_no_data: Some((scores.len() - count) as u64),
            mean: Some(mean),
            median: Some(median),
            min: Some(min),
            max: Some(max),
            high_feasibility: Some(valid.iter().filter(|s| **s >= 75.0).count() as u64),
            low_feasibility: Some(valid.iter().filter(|s| **s < 25.0).count() as u64),
        },
    }
}

fn describe_variables(
    collection: &FeatureCollection,
    metadata: &BTreeMap<String, (String, String)>,
) -> Vec<VariableDescriptor> {
    let mut columns: Vec<String> = Vec::new();
    for feature in &collection.features {
        for key in feature.properties.iter().flat_map(|p| p.keys()) {
            if !IDENTITY_KEYS.contains(&key.as_str())
                && !SCORE_KEYS.contains(&key.as_str())
                && !columns.contains(key)
            {
                columns.push(key.clone());
            }
        }
    }

    columns
        .into_iter()
        .filter_map(|field| {
            let values: Vec<f64> = collection.features.iter().filter_map(|f| numeric(f, &field)).collect();
            if values.is_empty() {
                return None;
            }
            let data_min = values.iter().copied().fold(f64::INFINITY, f64::min);
            let data_max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let data_mean = values.iter().sum::<f64>() / values.len() as f64;
            let (label, group) = metadata
                .get(&field)
                .cloned()
                .unwrap_or_else(|| (field.clone(), "Other".to_string()));
            Some(VariableDescriptor { field, label, description: String::new(), group, data_min, data_max, data_mean })
        })
        .collect()
}

#[async_trait]
impl ScoringService for MemoryScoringService {
    async fn locations(&self) -> Result<LocationListing> {
        let schema = LayerSchema::block();
        let mut blocks: Vec<BlockRow> = Vec::new();
        for feature in &self.blocks.features {
            if let (Some(district), Some(block)) =
                (text(feature, &schema.district_key), text(feature, &schema.block_key))
            {
                let row = BlockRow { block_name: block, district };
                if !blocks.contains(&row) {
                    blocks.push(row);
                }
            }
        }
        Ok(LocationListing { blocks, districts: Vec::new() })
    }

    async fn levels(&self) -> Result<LevelsInfo> {
        let gp_districts = self.gp_districts();
        Ok(LevelsInfo {
            levels: vec![
                LevelInfo { id: "block".into(), name: Some("Block".into()), available: true, districts: Vec::new() },
                LevelInfo {
                    id: "gp".into(),
                    name: Some("Gram Panchayat".into()),
                    available: self.gps.is_some(),
                    districts: gp_districts.clone(),
                },
            ],
            gp_districts,
        })
    }

    async fn gp_locations(&self) -> Result<Vec<GpLocation>> {
        let schema = LayerSchema::gp();
        let gp_key = schema.gp_key.as_deref().unwrap_or("GP_NAME");
        let code_key = schema.code_key.as_deref().unwrap_or("GP_CODE");
        Ok(self
            .gps
            .iter()
            .flat_map(|c| c.features.iter())
            .filter_map(|f| {
                Some(GpLocation {
                    name: text(f, gp_key)?,
                    code: text(f, code_key),
                    block: text(f, &schema.block_key)?,
                    district: text(f, &schema.district_key)?,
                })
            })
            .collect())
    }

    async fn interventions(&self) -> Result<BTreeMap<String, JsonValue>> {
        Ok(self
            .interventions
            .values()
            .map(|c| (c.name.clone(), json!({"key": c.name, "name": c.name, "description": c.description})))
            .collect())
    }

    async fn intervention_config(&self, name: &str) -> Result<JsonValue> {
        let config = self.interventions.get(name).ok_or_else(|| LeafError::Backend {
            status: 404,
            message: format!("Intervention \"{}\" not found", name),
        })?;
        Ok(serde_json::to_value(config)?)
    }

    async fn variables(&self, level: Level) -> Result<Vec<VariableDescriptor>> {
        Ok(describe_variables(self.layer(level)?, &self.metadata))
    }

    async fn feature_layer(&self, level: Level) -> Result<FeatureCollection> {
        self.layer(level).cloned()
    }

    async fn gp_block(&self, block: &str) -> Result<GpBlockListing> {
        let schema = LayerSchema::gp();
        let gp_key = schema.gp_key.as_deref().unwrap_or("GP_NAME");
        let code_key = schema.code_key.as_deref().unwrap_or("GP_CODE");
        let layer = self.layer(Level::Gp)?;

        let in_block: Vec<&Feature> = layer
            .features
            .iter()
            .filter(|f| text(f, &schema.block_key).as_deref() == Some(block))
            .collect();
        if in_block.is_empty() {
            return Err(LeafError::Backend { status: 404, message: format!("No GPs found in block \"{}\"", block) });
        }

        let district = in_block.iter().find_map(|f| text(f, &schema.district_key)).unwrap_or_default();
        let mut gps: Vec<GpSummary> = in_block
            .iter()
            .filter_map(|f| {
                Some(GpSummary {
                    name: text(f, gp_key)?,
                    code: text(f, code_key),
                    village_count: numeric(f, "VIL_COUNT").map_or(0, |n| n as u64),
                })
            })
            .collect();
        gps.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(GpBlockListing { block: block.to_string(), district, gps })
    }

    async fn calculate_feasibility(
        &self,
        level: Level,
        request: &FeasibilityRequest,
    ) -> Result<FeasibilityResponse> {
        let schema = LayerSchema::for_level(level);
        let mut layer = self.layer(level)?.clone();

        if level == Level::Gp {
            if let Some(block) = request.block.as_deref() {
                layer.features.retain(|f| text(f, &schema.block_key).as_deref() == Some(block));
            }
        }

        let (scored, scores) = score_collection(&layer, &request.filters);

        let scoped: Vec<Option<f64>> = match (level, request.district.as_deref()) {
            (Level::Block, Some(district)) => scored
                .features
                .iter()
                .zip(&scores)
                .filter(|(f, _)| text(f, &schema.district_key).as_deref() == Some(district))
                .map(|(_, s)| *s)
                .collect(),
            _ => scores,
        };

        tracing::debug!(?level, features = scored.features.len(), scoped = scoped.len(), "Scored features");
        Ok(FeasibilityResponse { geojson: scored, statistics: statistics(&scoped) })
    }

    async fn export_csv(&self, _request: &ExportRequest) -> Result<Vec<u8>> {
        Err(LeafError::Unsupported { operation: "CSV export".to_string() })
    }

    async fn recommendation(&self, _request: &RecommendationRequest) -> Result<Recommendation> {
        Err(LeafError::Unsupported { operation: "AI recommendation".to_string() })
    }
}
