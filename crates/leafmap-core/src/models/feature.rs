use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

use super::view::Level;

/// Identifier of a rendered map feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Property keys used to place a feature in the location hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSchema {
    pub level: Level,
    pub district_key: String,
    pub block_key: String,
    pub gp_key: Option<String>,
    /// Property holding a stable code, used when the feature has no id
    pub code_key: Option<String>,
}

impl LayerSchema {
    pub fn block() -> Self {
        Self {
            level: Level::Block,
            district_key: "Dist_Name".to_string(),
            block_key: "Block_name".to_string(),
            gp_key: None,
            code_key: Some("BLOCK_ID".to_string()),
        }
    }

    pub fn gp() -> Self {
        Self {
            level: Level::Gp,
            district_key: "Dist_Name".to_string(),
            block_key: "Block_Name".to_string(),
            gp_key: Some("GP_NAME".to_string()),
            code_key: Some("GP_CODE".to_string()),
        }
    }

    pub fn for_level(level: Level) -> Self {
        match level {
            Level::Block => Self::block(),
            Level::Gp => Self::gp(),
        }
    }
}

/// A feature of the rendered layer with its hierarchy placement resolved
#[derive(Debug, Clone, PartialEq)]
pub struct MapFeature {
    pub id: FeatureId,
    pub district: Option<String>,
    pub block: Option<String>,
    pub gp: Option<String>,
    pub geometry: Option<geojson::Geometry>,
    pub properties: Map<String, JsonValue>,
}

impl MapFeature {
    pub fn property(&self, key: &str) -> Option<&JsonValue> {
        self.properties.get(key)
    }

    /// Numeric value of a property; non-numeric values count as absent
    pub fn numeric(&self, key: &str) -> Option<f64> {
        self.property(key).and_then(parse_numeric)
    }

    /// Whether the feature lies inside the given location scope
    ///
    /// Empty scope components match everything.
    pub fn in_scope(&self, district: &str, block: &str, gp: &str) -> bool {
        matches_component(self.district.as_deref(), district)
            && matches_component(self.block.as_deref(), block)
            && matches_component(self.gp.as_deref(), gp)
    }
}

fn matches_component(value: Option<&str>, wanted: &str) -> bool {
    wanted.is_empty() || value == Some(wanted)
}

/// Parse a JSON property as a finite number
///
/// Numbers and numeric strings are accepted; everything else is no-data.
pub fn parse_numeric(value: &JsonValue) -> Option<f64> {
    let number = match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// A location name or code property, kept verbatim
///
/// Names are matched exactly, so no trimming or case folding happens here.
pub fn property_text(properties: &Map<String, JsonValue>, key: &str) -> Option<String> {
    match properties.get(key)? {
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The features currently loaded on the main map
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub schema: LayerSchema,
    features: Vec<MapFeature>,
}

impl FeatureLayer {
    pub fn from_collection(collection: &geojson::FeatureCollection, schema: LayerSchema) -> Self {
        let features = collection
            .features
            .iter()
            .enumerate()
            .map(|(idx, feature)| convert_feature(feature, idx, &schema))
            .collect();
        Self { schema, features }
    }

    pub fn empty(schema: LayerSchema) -> Self {
        Self { schema, features: Vec::new() }
    }

    pub fn level(&self) -> Level {
        self.schema.level
    }

    pub fn features(&self) -> &[MapFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, id: &FeatureId) -> Option<&MapFeature> {
        self.features.iter().find(|f| &f.id == id)
    }

    /// Features matching the location scope
    pub fn visible<'a>(
        &'a self,
        district: &'a str,
        block: &'a str,
        gp: &'a str,
    ) -> impl Iterator<Item = &'a MapFeature> + 'a {
        self.features.iter().filter(move |f| f.in_scope(district, block, gp))
    }

    /// First feature for a block (and GP, on GP layers)
    pub fn find_location(&self, block: &str, gp: Option<&str>) -> Option<&MapFeature> {
        self.features.iter().find(|f| {
            f.block.as_deref() == Some(block) && gp.map_or(true, |gp| f.gp.as_deref() == Some(gp))
        })
    }
}

fn convert_feature(feature: &geojson::Feature, idx: usize, schema: &LayerSchema) -> MapFeature {
    let properties = feature.properties.clone().unwrap_or_default();
    let text = |key: &str| property_text(&properties, key);

    let id = feature
        .id
        .as_ref()
        .map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
        .or_else(|| schema.code_key.as_deref().and_then(text))
        .unwrap_or_else(|| idx.to_string());

    MapFeature {
        id: FeatureId(id),
        district: text(&schema.district_key),
        block: text(&schema.block_key),
        gp: schema.gp_key.as_deref().and_then(text),
        geometry: feature.geometry.clone(),
        properties,
    }
}
