//! Feasibility classification results
//!
//! The label/color table is shared with the scoring service and must not be
//! altered on one side only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::feature::FeatureId;

pub const NO_DATA_COLOR: &str = "#E0E0E0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeasibilityLabel {
    VeryHigh,
    High,
    ModerateHigh,
    Moderate,
    Low,
    VeryLow,
    NoData,
}

impl FeasibilityLabel {
    pub const ALL: [FeasibilityLabel; 7] = [
        FeasibilityLabel::VeryHigh,
        FeasibilityLabel::High,
        FeasibilityLabel::ModerateHigh,
        FeasibilityLabel::Moderate,
        FeasibilityLabel::Low,
        FeasibilityLabel::VeryLow,
        FeasibilityLabel::NoData,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FeasibilityLabel::VeryHigh => "very_high",
            FeasibilityLabel::High => "high",
            FeasibilityLabel::ModerateHigh => "moderate_high",
            FeasibilityLabel::Moderate => "moderate",
            FeasibilityLabel::Low => "low",
            FeasibilityLabel::VeryLow => "very_low",
            FeasibilityLabel::NoData => "no_data",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            FeasibilityLabel::VeryHigh => "#1b5e20",
            FeasibilityLabel::High => "#81c784",
            FeasibilityLabel::ModerateHigh => "#c5e1a5",
            FeasibilityLabel::Moderate => "#ffd700",
            FeasibilityLabel::Low => "#ff8c00",
            FeasibilityLabel::VeryLow => "#ff0000",
            FeasibilityLabel::NoData => NO_DATA_COLOR,
        }
    }

    pub fn bucket(&self) -> DistributionBucket {
        match self {
            FeasibilityLabel::VeryHigh => DistributionBucket::Full,
            FeasibilityLabel::High => DistributionBucket::From75,
            FeasibilityLabel::ModerateHigh => DistributionBucket::From50,
            FeasibilityLabel::Moderate => DistributionBucket::From25,
            FeasibilityLabel::Low => DistributionBucket::From1,
            FeasibilityLabel::VeryLow => DistributionBucket::Zero,
            FeasibilityLabel::NoData => DistributionBucket::NoData,
        }
    }

    /// Classify a score with the shared threshold table
    pub fn from_score(score: Option<f64>) -> Self {
        match score {
            Some(v) if v.is_nan() => FeasibilityLabel::NoData,
            Some(v) if v >= 100.0 => FeasibilityLabel::VeryHigh,
            Some(v) if v >= 75.0 => FeasibilityLabel::High,
            Some(v) if v >= 50.0 => FeasibilityLabel::ModerateHigh,
            Some(v) if v >= 25.0 => FeasibilityLabel::Moderate,
            Some(v) if v >= 1.0 => FeasibilityLabel::Low,
            Some(_) => FeasibilityLabel::VeryLow,
            None => FeasibilityLabel::NoData,
        }
    }

    /// Accepts either the label key or the bucket display text
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        Self::ALL
            .into_iter()
            .find(|label| label.key() == text || label.bucket().display() == text)
    }
}

/// The seven fixed histogram buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DistributionBucket {
    #[serde(rename = "100%")]
    Full,
    #[serde(rename = "75-100%")]
    From75,
    #[serde(rename = "50-75%")]
    From50,
    #[serde(rename = "25-50%")]
    From25,
    #[serde(rename = "1-25%")]
    From1,
    #[serde(rename = "0%")]
    Zero,
    #[serde(rename = "No Data")]
    NoData,
}

impl DistributionBucket {
    pub const ALL: [DistributionBucket; 7] = [
        DistributionBucket::Full,
        DistributionBucket::From75,
        DistributionBucket::From50,
        DistributionBucket::From25,
        DistributionBucket::From1,
        DistributionBucket::Zero,
        DistributionBucket::NoData,
    ];

    pub fn display(&self) -> &'static str {
        match self {
            DistributionBucket::Full => "100%",
            DistributionBucket::From75 => "75-100%",
            DistributionBucket::From50 => "50-75%",
            DistributionBucket::From25 => "25-50%",
            DistributionBucket::From1 => "1-25%",
            DistributionBucket::Zero => "0%",
            DistributionBucket::NoData => "No Data",
        }
    }

    pub fn from_display(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.display() == text.trim())
    }
}

/// Count of features per bucket; always carries all seven buckets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution(BTreeMap<DistributionBucket, u64>);

impl Default for Distribution {
    fn default() -> Self {
        Self(DistributionBucket::ALL.into_iter().map(|b| (b, 0)).collect())
    }
}

impl Distribution {
    /// Build from a wire map keyed by bucket display text; unknown keys are ignored
    pub fn from_wire(map: &BTreeMap<String, u64>) -> Self {
        let mut distribution = Self::default();
        for (key, count) in map {
            match DistributionBucket::from_display(key) {
                Some(bucket) => distribution.add(bucket, *count),
                None => tracing::debug!(bucket = %key, "Ignoring unknown distribution bucket"),
            }
        }
        distribution
    }

    pub fn from_labels<I: IntoIterator<Item = FeasibilityLabel>>(labels: I) -> Self {
        let mut distribution = Self::default();
        for label in labels {
            distribution.add(label.bucket(), 1);
        }
        distribution
    }

    pub fn add(&mut self, bucket: DistributionBucket, count: u64) {
        *self.0.entry(bucket).or_insert(0) += count;
    }

    pub fn count(&self, bucket: DistributionBucket) -> u64 {
        self.0.get(&bucket).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Buckets in fixed display order
    pub fn entries(&self) -> Vec<(DistributionBucket, u64)> {
        DistributionBucket::ALL.into_iter().map(|b| (b, self.count(b))).collect()
    }
}

/// Summary statistics reported by the scoring service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityStatistics {
    #[serde(default)]
    pub total_blocks: Option<u64>,
    #[serde(default)]
    pub blocks_with_data: Option<u64>,
    #[serde(default)]
    pub blocks_no_data: Option<u64>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub median: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub high_feasibility: Option<u64>,
    #[serde(default)]
    pub low_feasibility: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureClassification {
    pub feature_id: FeatureId,
    /// One entry per active filter, in filter order; `None` when the value is absent
    pub passes: Vec<Option<bool>>,
    pub feasibility_score: Option<f64>,
    pub feasibility_label: FeasibilityLabel,
    pub feasibility_color: String,
}

/// Outcome of one classification request; replaced wholesale, never patched
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub generation: u64,
    /// Filter revision the request was built from
    pub filter_revision: u64,
    pub features: Vec<FeatureClassification>,
    pub distribution: Distribution,
    pub statistics: FeasibilityStatistics,
}

impl ClassificationResult {
    pub fn get(&self, id: &FeatureId) -> Option<&FeatureClassification> {
        self.features.iter().find(|f| &f.feature_id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_thresholds() {
        assert_eq!(FeasibilityLabel::from_score(Some(100.0)), FeasibilityLabel::VeryHigh);
        assert_eq!(FeasibilityLabel::from_score(Some(99.99)), FeasibilityLabel::High);
        assert_eq!(FeasibilityLabel::from_score(Some(50.0)), FeasibilityLabel::ModerateHigh);
        assert_eq!(FeasibilityLabel::from_score(Some(24.9)), FeasibilityLabel::Low);
        assert_eq!(FeasibilityLabel::from_score(Some(0.5)), FeasibilityLabel::VeryLow);
        assert_eq!(FeasibilityLabel::from_score(None), FeasibilityLabel::NoData);
    }

    #[test]
    fn test_label_parsing_accepts_keys_and_display() {
        assert_eq!(FeasibilityLabel::parse("moderate_high"), Some(FeasibilityLabel::ModerateHigh));
        assert_eq!(FeasibilityLabel::parse("75-100%"), Some(FeasibilityLabel::High));
        assert_eq!(FeasibilityLabel::parse("No Data"), Some(FeasibilityLabel::NoData));
        assert_eq!(FeasibilityLabel::parse("excellent"), None);
    }

    #[test]
    fn test_distribution_fills_missing_buckets() {
        let mut wire = BTreeMap::new();
        wire.insert("100%".to_string(), 3);
        wire.insert("No Data".to_string(), 2);
        wire.insert("bogus".to_string(), 9);

        let distribution = Distribution::from_wire(&wire);
        assert_eq!(distribution.entries().len(), 7);
        assert_eq!(distribution.count(DistributionBucket::Full), 3);
        assert_eq!(distribution.count(DistributionBucket::From50), 0);
        assert_eq!(distribution.total(), 5);
    }

    #[test]
    fn test_distribution_serializes_display_keys() {
        let distribution = Distribution::from_labels([FeasibilityLabel::Low]);
        let json = serde_json::to_value(&distribution).unwrap();
        assert_eq!(json["1-25%"], 1);
        assert_eq!(json["No Data"], 0);
    }
}
