use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

use crate::models::feature::{parse_numeric, FeatureLayer, LayerSchema};
use crate::models::{
    ClassificationResult, Distribution, FeasibilityLabel, FeasibilityStatistics,
    FeatureClassification, Filter,
};

/// Response of `POST /calculate-feasibility` and `POST /gp/calculate-feasibility`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeasibilityResponse {
    pub geojson: geojson::FeatureCollection,
    #[serde(default)]
    pub statistics: WireStatistics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireStatistics {
    #[serde(default)]
    pub distribution: Option<BTreeMap<String, u64>>,
    #[serde(flatten)]
    pub summary: FeasibilityStatistics,
}

/// Turn a scoring response into a classification result
///
/// Scores and labels are taken as served. A missing label is derived from the
/// shared threshold table, and a missing color from the shared color table.
pub fn classify_response(
    response: &FeasibilityResponse,
    filters: &[Filter],
    schema: &LayerSchema,
    generation: u64,
    filter_revision: u64,
) -> ClassificationResult {
    let layer = FeatureLayer::from_collection(&response.geojson, schema.clone());

    let features: Vec<FeatureClassification> = layer
        .features()
        .iter()
        .map(|feature| {
            let score = feature.property("feasibility").and_then(parse_numeric);
            let label = feature
                .property("feasibility_label")
                .and_then(JsonValue::as_str)
                .and_then(FeasibilityLabel::parse)
                .or_else(|| {
                    feature
                        .property("feasibility_class")
                        .and_then(JsonValue::as_str)
                        .and_then(FeasibilityLabel::parse)
                })
                .unwrap_or_else(|| FeasibilityLabel::from_score(score));
            let color = match label {
                FeasibilityLabel::NoData => FeasibilityLabel::NoData.color().to_string(),
                _ => feature
                    .property("feasibility_color")
                    .and_then(JsonValue::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| label.color().to_string()),
            };
            let passes = filters.iter().map(|f| f.matches(feature.numeric(&f.column))).collect();

            FeatureClassification {
                feature_id: feature.id.clone(),
                passes,
                feasibility_score: score,
                feasibility_label: label,
                feasibility_color: color,
            }
        })
        .collect();

    let distribution = match &response.statistics.distribution {
        Some(wire) => Distribution::from_wire(wire),
        None => Distribution::from_labels(features.iter().map(|f| f.feasibility_label)),
    };

    ClassificationResult {
        generation,
        filter_revision,
        features,
        distribution,
        statistics: response.statistics.summary.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DistributionBucket, FeatureId, Preference};
    use serde_json::json;

    fn response(with_distribution: bool) -> FeasibilityResponse {
        let mut value = json!({
            "geojson": {
                "type": "FeatureCollection",
                "features": [
                    {"type": "Feature", "id": "b1", "geometry": null, "properties": {
                        "B": 20, "feasibility": 100.0, "feasibility_label": "100%",
                        "feasibility_color": "#1b5e20"}},
                    {"type": "Feature", "id": "b2", "geometry": null, "properties": {
                        "B": 80, "feasibility": 40.0}},
                    {"type": "Feature", "id": "b3", "geometry": null, "properties": {
                        "feasibility": null, "feasibility_color": "#123456"}}
                ]
            },
            "statistics": {"total_blocks": 3, "mean": 70.0}
        });
        if with_distribution {
            value["statistics"]["distribution"] = json!({"100%": 1, "25-50%": 1, "No Data": 1});
        }
        serde_json::from_value(value).unwrap()
    }

    fn filter() -> Filter {
        Filter {
            column: "B".into(),
            min_val: 10.0,
            max_val: 50.0,
            weight: 1.0,
            label: "B".into(),
            group: "Water".into(),
            preference: Preference::Moderate,
            data_min: 0.0,
            data_max: 100.0,
        }
    }

    #[test]
    fn test_labels_and_colors() {
        let result = classify_response(&response(true), &[filter()], &LayerSchema::block(), 4, 9);
        assert_eq!(result.generation, 4);
        assert_eq!(result.filter_revision, 9);

        let b2 = result.get(&FeatureId("b2".into())).unwrap();
        assert_eq!(b2.feasibility_label, FeasibilityLabel::Moderate);
        assert_eq!(b2.feasibility_color, "#ffd700");

        // No-data always uses the sentinel color
        let b3 = result.get(&FeatureId("b3".into())).unwrap();
        assert_eq!(b3.feasibility_label, FeasibilityLabel::NoData);
        assert_eq!(b3.feasibility_color, "#E0E0E0");
        assert_eq!(result.statistics.total_blocks, Some(3));
    }

    #[test]
    fn test_pass_flags_per_filter() {
        let result = classify_response(&response(true), &[filter()], &LayerSchema::block(), 1, 1);
        let passes: Vec<Vec<Option<bool>>> = result.features.iter().map(|f| f.passes.clone()).collect();
        assert_eq!(passes, vec![vec![Some(true)], vec![Some(false)], vec![None]]);
    }

    #[test]
    fn test_distribution_rebuilt_when_missing() {
        let result = classify_response(&response(false), &[], &LayerSchema::block(), 1, 1);
        assert_eq!(result.distribution.total(), 3);
        assert_eq!(result.distribution.count(DistributionBucket::From25), 1);
        assert_eq!(result.distribution.count(DistributionBucket::NoData), 1);
    }
}
