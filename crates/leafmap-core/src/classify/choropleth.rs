use serde::{Deserialize, Serialize};

use crate::models::classification::NO_DATA_COLOR;
use crate::models::MapFeature;

pub const BIN_COUNT: usize = 5;

/// Sequential ramp, light to dark
pub const CHOROPLETH_RAMP: [&str; BIN_COUNT] = ["#eff3ff", "#bdd7e7", "#6baed6", "#3182bd", "#08519c"];

/// Equal-interval bucketing of one variable over the visible features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoroplethScale {
    pub field: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub color: String,
}

impl ChoroplethScale {
    /// Scan values for the range; `[0, 1]` when there are none, widened by one when flat
    ///
    /// Flat ranges too large for a unit step widen by one relative epsilon.
    pub fn from_values<I: IntoIterator<Item = f64>>(field: impl Into<String>, values: I) -> Self {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |range: Option<(f64, f64)>, v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .unwrap_or((0.0, 1.0));

        let max = if min == max { min + 1.0_f64.max(min.abs() * f64::EPSILON) } else { max };
        Self { field: field.into(), min, max }
    }

    /// Scale for `field` over the given features
    pub fn for_features<'a, I>(field: &str, features: I) -> Self
    where
        I: IntoIterator<Item = &'a MapFeature>,
    {
        Self::from_values(field, features.into_iter().filter_map(|f| f.numeric(field)))
    }

    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / BIN_COUNT as f64
    }

    /// Bin index in `0..BIN_COUNT`; out-of-range values are clamped
    pub fn bin(&self, value: f64) -> usize {
        if value >= self.max {
            return BIN_COUNT - 1;
        }
        let raw = ((value - self.min) / self.bin_width()).floor();
        if raw.is_nan() || raw < 0.0 {
            0
        } else {
            (raw as usize).min(BIN_COUNT - 1)
        }
    }

    pub fn color(&self, value: Option<f64>) -> &'static str {
        match value {
            Some(v) if v.is_finite() => CHOROPLETH_RAMP[self.bin(v)],
            _ => NO_DATA_COLOR,
        }
    }

    pub fn color_for(&self, feature: &MapFeature) -> &'static str {
        self.color(feature.numeric(&self.field))
    }

    pub fn legend(&self) -> Vec<LegendEntry> {
        let width = self.bin_width();
        let mut entries: Vec<LegendEntry> = CHOROPLETH_RAMP
            .iter()
            .enumerate()
            .map(|(idx, color)| {
                let lower = self.min + width * idx as f64;
                let upper = if idx == BIN_COUNT - 1 { self.max } else { lower + width };
                LegendEntry {
                    label: format!("{} - {}", format_bound(lower), format_bound(upper)),
                    lower: Some(lower),
                    upper: Some(upper),
                    color: color.to_string(),
                }
            })
            .collect();
        entries.push(LegendEntry {
            label: "No Data".to_string(),
            lower: None,
            upper: None,
            color: NO_DATA_COLOR.to_string(),
        });
        entries
    }
}

fn format_bound(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
