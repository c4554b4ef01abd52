use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::filter::Preference;

/// Metadata for one map variable, as served by the scoring service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDescriptor {
    /// Stable machine code (the feature property key)
    pub field: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_group")]
    pub group: String,
    pub data_min: f64,
    pub data_max: f64,
    pub data_mean: f64,
}

fn default_group() -> String {
    "Other".to_string()
}

/// One variable of an intervention, with its default filter range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionVariable {
    pub field: String,
    pub label: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_group")]
    pub group: String,
    pub range_min: f64,
    pub range_max: f64,
    pub data_min: f64,
    pub data_max: f64,
    pub data_mean: f64,
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub preference: Preference,
}

fn default_weight() -> f64 {
    1.0
}

impl InterventionVariable {
    pub fn descriptor(&self) -> VariableDescriptor {
        VariableDescriptor {
            field: self.field.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            group: self.group.clone(),
            data_min: self.data_min,
            data_max: self.data_max,
            data_mean: self.data_mean,
        }
    }
}

/// Response of `GET /intervention/{name}/config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub variables: Vec<InterventionVariable>,
}

/// Read-only lookup of variable descriptors by field code
#[derive(Debug, Clone, Default)]
pub struct VariableCatalog {
    variables: Vec<VariableDescriptor>,
    by_field: HashMap<String, usize>,
}

impl VariableCatalog {
    pub fn new(variables: Vec<VariableDescriptor>) -> Self {
        let mut catalog = Self::default();
        for variable in variables {
            if catalog.by_field.contains_key(&variable.field) {
                tracing::debug!(field = %variable.field, "Skipping duplicate variable descriptor");
                continue;
            }
            catalog.by_field.insert(variable.field.clone(), catalog.variables.len());
            catalog.variables.push(variable);
        }
        catalog
    }

    pub fn get(&self, field: &str) -> Option<&VariableDescriptor> {
        self.by_field.get(field).map(|&idx| &self.variables[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableDescriptor> {
        self.variables.iter()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Display label for a field, falling back to the field code
    pub fn label<'a>(&'a self, field: &'a str) -> &'a str {
        self.get(field).map(|v| v.label.as_str()).unwrap_or(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(field: &str, label: &str) -> VariableDescriptor {
        VariableDescriptor {
            field: field.into(),
            label: label.into(),
            description: String::new(),
            group: "Water".into(),
            data_min: 0.0,
            data_max: 10.0,
            data_mean: 5.0,
        }
    }

    #[test]
    fn test_catalog_keeps_first_duplicate() {
        let catalog =
            VariableCatalog::new(vec![descriptor("GW", "Groundwater"), descriptor("GW", "Other")]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.label("GW"), "Groundwater");
        assert_eq!(catalog.label("MISSING"), "MISSING");
    }

    #[test]
    fn test_intervention_variable_defaults() {
        let json = serde_json::json!({
            "field": "AD", "label": "Area", "range_min": 1.0, "range_max": 4.0,
            "data_min": 0.0, "data_max": 9.0, "data_mean": 3.0
        });
        let variable: InterventionVariable = serde_json::from_value(json).unwrap();
        assert_eq!(variable.weight, 1.0);
        assert_eq!(variable.preference, Preference::Moderate);
        assert_eq!(variable.group, "Other");
    }
}
