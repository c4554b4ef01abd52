//! Filter set model
//!
//! An ordered collection of variable filters combined with `AND`/`OR` logic.
//! Every mutation bumps the set's revision, which marks any classification
//! computed from an older revision as stale.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::variable::{InterventionConfig, VariableDescriptor};
use crate::error::{LeafError, Result};

/// Which side of a variable's range is considered favorable
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preference {
    /// Lower values are favorable; the lower bound is pinned to the data minimum
    Lower,
    /// Higher values are favorable; the upper bound is pinned to the data maximum
    Higher,
    #[default]
    Moderate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterLogic {
    #[default]
    And,
    Or,
}

impl fmt::Display for FilterLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterLogic::And => write!(f, "AND"),
            FilterLogic::Or => write!(f, "OR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub min_val: f64,
    pub max_val: f64,
    pub weight: f64,
    pub label: String,
    pub group: String,
    pub preference: Preference,
    pub data_min: f64,
    pub data_max: f64,
}

impl Filter {
    /// Full-range filter for a variable with moderate preference
    pub fn from_descriptor(descriptor: &VariableDescriptor) -> Self {
        Self {
            column: descriptor.field.clone(),
            min_val: descriptor.data_min,
            max_val: descriptor.data_max,
            weight: 1.0,
            label: descriptor.label.clone(),
            group: descriptor.group.clone(),
            preference: Preference::Moderate,
            data_min: descriptor.data_min,
            data_max: descriptor.data_max,
        }
    }

    pub fn min_editable(&self) -> bool {
        self.preference != Preference::Lower
    }

    pub fn max_editable(&self) -> bool {
        self.preference != Preference::Higher
    }

    /// `None` when the feature has no value for this column
    pub fn matches(&self, value: Option<f64>) -> Option<bool> {
        value.map(|v| v >= self.min_val && v <= self.max_val)
    }

    fn apply_preference(&mut self, preference: Preference) {
        self.preference = preference;
        match preference {
            Preference::Lower => {
                self.min_val = self.data_min;
                if self.max_val < self.min_val {
                    self.max_val = self.min_val;
                }
            }
            Preference::Higher => {
                self.max_val = self.data_max;
                if self.min_val > self.max_val {
                    self.min_val = self.max_val;
                }
            }
            Preference::Moderate => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    filters: Vec<Filter>,
    logic: FilterLogic,
    #[serde(skip)]
    revision: u64,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn logic(&self) -> FilterLogic {
        self.logic
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn get(&self, column: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.column == column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// Columns in insertion order
    pub fn columns(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.column.as_str()).collect()
    }

    /// Replace the whole set with the defaults of an intervention config
    ///
    /// A config that cannot be parsed, or that declares an inverted range or a
    /// repeated column, leaves the set empty and returns the reason.
    pub fn set_from_intervention_config(&mut self, config: &serde_json::Value) -> Result<()> {
        let parsed = parse_intervention_filters(config);
        self.touch();
        match parsed {
            Ok(filters) => {
                self.filters = filters;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring malformed intervention configuration");
                self.filters.clear();
                Err(e)
            }
        }
    }

    pub fn apply_preference_change(&mut self, column: &str, preference: Preference) -> Result<()> {
        self.get_mut(column)?.apply_preference(preference);
        self.touch();
        Ok(())
    }

    /// Append a full-range moderate filter; returns false if the column is present
    pub fn add_variable(&mut self, descriptor: &VariableDescriptor) -> bool {
        if self.contains(&descriptor.field) {
            tracing::debug!(column = %descriptor.field, "Filter already present");
            return false;
        }
        self.filters.push(Filter::from_descriptor(descriptor));
        self.touch();
        true
    }

    /// Edit the bounds of a filter; a locked bound must be passed unchanged
    pub fn set_bounds(&mut self, column: &str, min_val: f64, max_val: f64) -> Result<()> {
        let filter = self.get_mut(column)?;
        if !filter.min_editable() && min_val != filter.min_val {
            return Err(LeafError::BoundLocked { column: column.to_string(), bound: "min" });
        }
        if !filter.max_editable() && max_val != filter.max_val {
            return Err(LeafError::BoundLocked { column: column.to_string(), bound: "max" });
        }
        if !(min_val <= max_val) {
            return Err(LeafError::InvalidRange { column: column.to_string(), min: min_val, max: max_val });
        }
        filter.min_val = min_val;
        filter.max_val = max_val;
        self.touch();
        Ok(())
    }

    pub fn set_weight(&mut self, column: &str, weight: f64) -> Result<()> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(LeafError::InvalidRange { column: column.to_string(), min: weight, max: weight });
        }
        self.get_mut(column)?.weight = weight;
        self.touch();
        Ok(())
    }

    pub fn set_logic(&mut self, logic: FilterLogic) {
        self.logic = logic;
        self.touch();
    }

    /// Keep only the checked variables (gram-panchayat mode commit)
    ///
    /// Unchecked filters are dropped entirely. Checked variables not yet in the
    /// set are added from their descriptors.
    pub fn commit_selection(&mut self, included: &HashSet<String>, descriptors: &[VariableDescriptor]) {
        self.filters.retain(|f| included.contains(&f.column));
        for descriptor in descriptors {
            if included.contains(&descriptor.field) && !self.contains(&descriptor.field) {
                self.filters.push(Filter::from_descriptor(descriptor));
            }
        }
        self.touch();
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.touch();
    }

    fn get_mut(&mut self, column: &str) -> Result<&mut Filter> {
        self.filters
            .iter_mut()
            .find(|f| f.column == column)
            .ok_or_else(|| LeafError::FilterNotFound { column: column.to_string() })
    }

    fn touch(&mut self) {
        self.revision += 1;
    }
}

fn parse_intervention_filters(config: &serde_json::Value) -> Result<Vec<Filter>> {
    let config: InterventionConfig = serde_json::from_value(config.clone())
        .map_err(|e| LeafError::MalformedConfig { reason: e.to_string() })?;

    let mut seen = HashSet::new();
    let mut filters = Vec::with_capacity(config.variables.len());
    for variable in &config.variables {
        if !seen.insert(variable.field.clone()) {
            return Err(LeafError::MalformedConfig {
                reason: format!("variable '{}' is listed twice", variable.field),
            });
        }
        if !(variable.range_min <= variable.range_max) {
            return Err(LeafError::MalformedConfig {
                reason: format!(
                    "variable '{}' has range {}..{}",
                    variable.field, variable.range_min, variable.range_max
                ),
            });
        }
        let mut filter = Filter {
            column: variable.field.clone(),
            min_val: variable.range_min,
            max_val: variable.range_max,
            weight: variable.weight,
            label: variable.label.clone(),
            group: variable.group.clone(),
            preference: Preference::Moderate,
            data_min: variable.data_min,
            data_max: variable.data_max,
        };
        filter.apply_preference(variable.preference);
        filters.push(filter);
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(field: &str, min: f64, max: f64) -> VariableDescriptor {
        VariableDescriptor {
            field: field.into(),
            label: field.to_lowercase(),
            description: String::new(),
            group: "Water".into(),
            data_min: min,
            data_max: max,
            data_mean: (min + max) / 2.0,
        }
    }

    fn intervention() -> serde_json::Value {
        json!({
            "name": "Farm Ponds",
            "variables": [
                {"field": "A", "label": "Rainfall", "group": "Climate", "range_min": 800.0,
                 "range_max": 1200.0, "data_min": 500.0, "data_max": 3000.0, "data_mean": 1500.0,
                 "weight": 2.0, "preference": "higher"},
                {"field": "B", "label": "Slope", "range_min": 0.0, "range_max": 5.0,
                 "data_min": 0.0, "data_max": 30.0, "data_mean": 6.0}
            ]
        })
    }

    #[test]
    fn test_set_from_intervention_config() {
        let mut set = FilterSet::new();
        set.set_from_intervention_config(&intervention()).unwrap();

        assert_eq!(set.columns(), vec!["A", "B"]);
        let rainfall = set.get("A").unwrap();
        assert_eq!(rainfall.preference, Preference::Higher);
        assert_eq!(rainfall.max_val, 3000.0);
        assert_eq!(rainfall.min_val, 800.0);
        assert!(!rainfall.max_editable());
        assert_eq!(set.get("B").unwrap().weight, 1.0);
    }

    #[test]
    fn test_malformed_config_yields_empty_set() {
        let mut set = FilterSet::new();
        set.add_variable(&descriptor("X", 0.0, 1.0));

        let err = set.set_from_intervention_config(&json!({"name": "Broken", "variables": "nope"}));
        assert!(matches!(err, Err(LeafError::MalformedConfig { .. })));
        assert!(set.is_empty());

        let mut inverted = intervention();
        inverted["variables"][1]["range_min"] = json!(10.0);
        assert!(set.set_from_intervention_config(&inverted).is_err());
        assert!(set.is_empty());
    }

    #[test]
    fn test_preference_lower_pins_min() {
        let mut set = FilterSet::new();
        set.add_variable(&descriptor("V", 0.0, 100.0));
        set.set_bounds("V", 20.0, 60.0).unwrap();

        set.apply_preference_change("V", Preference::Lower).unwrap();
        let filter = set.get("V").unwrap();
        assert_eq!(filter.min_val, 0.0);
        assert_eq!(filter.max_val, 60.0);
        assert!(!filter.min_editable());
        assert!(filter.max_editable());
    }

    #[test]
    fn test_moderate_keeps_values_and_unlocks() {
        let mut set = FilterSet::new();
        set.add_variable(&descriptor("V", 0.0, 100.0));
        set.set_bounds("V", 20.0, 60.0).unwrap();
        set.apply_preference_change("V", Preference::Higher).unwrap();
        set.apply_preference_change("V", Preference::Moderate).unwrap();

        let filter = set.get("V").unwrap();
        assert_eq!((filter.min_val, filter.max_val), (20.0, 100.0));
        assert!(filter.min_editable() && filter.max_editable());
    }

    #[test]
    fn test_locked_bound_rejects_edit() {
        let mut set = FilterSet::new();
        set.add_variable(&descriptor("V", 0.0, 100.0));
        set.apply_preference_change("V", Preference::Lower).unwrap();

        assert!(matches!(
            set.set_bounds("V", 5.0, 50.0),
            Err(LeafError::BoundLocked { bound: "min", .. })
        ));
        assert!(set.set_bounds("V", 0.0, 50.0).is_ok());
        assert!(matches!(set.set_bounds("V", 0.0, -1.0), Err(LeafError::InvalidRange { .. })));
    }

    #[test]
    fn test_add_variable_rejects_duplicate() {
        let mut set = FilterSet::new();
        assert!(set.add_variable(&descriptor("V", 0.0, 1.0)));
        let revision = set.revision();
        assert!(!set.add_variable(&descriptor("V", 5.0, 9.0)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.revision(), revision);
    }

    #[test]
    fn test_every_mutation_bumps_revision() {
        let mut set = FilterSet::new();
        let start = set.revision();
        set.add_variable(&descriptor("V", 0.0, 1.0));
        set.set_logic(FilterLogic::Or);
        set.set_weight("V", 2.0).unwrap();
        assert_eq!(set.revision(), start + 3);
    }

    #[test]
    fn test_commit_selection_drops_unchecked() {
        let descriptors =
            vec![descriptor("A", 0.0, 1.0), descriptor("B", 0.0, 1.0), descriptor("C", 0.0, 1.0)];
        let mut set = FilterSet::new();
        set.add_variable(&descriptors[0]);
        set.add_variable(&descriptors[1]);

        let included: HashSet<String> = ["B".to_string(), "C".to_string()].into_iter().collect();
        set.commit_selection(&included, &descriptors);

        assert_eq!(set.columns(), vec!["B", "C"]);
    }

    #[test]
    fn test_logic_serializes_uppercase() {
        assert_eq!(serde_json::to_value(FilterLogic::Or).unwrap(), json!("OR"));
        assert_eq!(serde_json::to_value(Preference::Lower).unwrap(), json!("lower"));
    }
}
