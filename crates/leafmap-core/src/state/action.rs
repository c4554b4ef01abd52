use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::classify::FeasibilityResponse;
use crate::models::{FeatureId, FilterLogic, Level, Preference};
use crate::ports::GpBlockListing;

/// A user intent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// District dropdown; an empty name clears the selection
    SelectDistrict { name: String },
    /// Block dropdown; an empty name returns to the overview
    SelectBlock { name: String },
    /// Gram-panchayat dropdown; an empty name returns to the overview
    SelectGp { name: String },
    /// Click on a map feature
    SelectFeature { feature_id: FeatureId },
    BackToOverview,
    /// Choropleth on for `field`, or off when `field` is already active
    ToggleVariable { field: String },
    ClearVariable,
    SelectIntervention { name: String },
    OpenFilterConfig,
    CloseFilterConfig,
    ChangePreference { column: String, preference: Preference },
    AddVariable { field: String },
    SetBounds { column: String, min: f64, max: f64 },
    SetWeight { column: String, weight: f64 },
    SetLogic { logic: FilterLogic },
    /// Gram-panchayat checkbox commit; unchecked variables are dropped
    CommitGpSelection { included: Vec<String> },
    DismissAlert,
}

/// Completion of a remote effect
#[derive(Debug, Clone)]
pub enum Event {
    LayerLoaded { level: Level, collection: geojson::FeatureCollection },
    LayerFailed { level: Level, reason: String },
    InterventionConfigLoaded { name: String, config: JsonValue },
    InterventionConfigFailed { name: String, reason: String },
    GpPickerLoaded { listing: GpBlockListing },
    GpPickerFailed { block: String, reason: String },
    ClassificationLoaded { generation: u64, response: Box<FeasibilityResponse> },
    ClassificationFailed { generation: u64, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_actions_use_tagged_json() {
        let action: Action =
            serde_json::from_value(json!({"type": "select_district", "name": "Tinsukia"})).unwrap();
        assert_eq!(action, Action::SelectDistrict { name: "Tinsukia".into() });

        let action: Action = serde_json::from_value(
            json!({"type": "change_preference", "column": "AD", "preference": "lower"}),
        )
        .unwrap();
        assert_eq!(
            action,
            Action::ChangePreference { column: "AD".into(), preference: Preference::Lower }
        );

        let action: Action = serde_json::from_value(json!({"type": "back_to_overview"})).unwrap();
        assert_eq!(action, Action::BackToOverview);
    }
}
