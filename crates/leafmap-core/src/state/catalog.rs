use std::collections::BTreeMap;

use crate::error::Result;
use crate::models::{Level, LevelsInfo, LocationHierarchy, VariableCatalog};
use crate::ports::ScoringService;

/// Process-wide read-only caches loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub hierarchy: LocationHierarchy,
    pub block_variables: VariableCatalog,
    pub gp_variables: VariableCatalog,
    /// Intervention names, sorted
    pub interventions: Vec<String>,
}

impl Catalog {
    /// Load every cache from the scoring service
    ///
    /// Location and intervention listings are required. Gram-panchayat data is
    /// optional and degrades to an empty listing when unavailable.
    pub async fn load(service: &dyn ScoringService) -> Result<Self> {
        let listing = service.locations().await?;

        let levels = service.levels().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Level listing unavailable, assuming block level only");
            LevelsInfo::default()
        });

        let gp_locations = service.gp_locations().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Gram-panchayat locations unavailable");
            Vec::new()
        });

        let interventions: BTreeMap<String, serde_json::Value> = service.interventions().await?;

        let block_variables = service.variables(Level::Block).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Block variable metadata unavailable");
            Vec::new()
        });

        let gp_variables = service.variables(Level::Gp).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Gram-panchayat variable metadata unavailable");
            Vec::new()
        });

        let catalog = Self {
            hierarchy: LocationHierarchy::build(&listing, &levels, &gp_locations),
            block_variables: VariableCatalog::new(block_variables),
            gp_variables: VariableCatalog::new(gp_variables),
            interventions: interventions.into_keys().collect(),
        };

        tracing::info!(
            districts = catalog.hierarchy.districts().len(),
            block_variables = catalog.block_variables.len(),
            gp_variables = catalog.gp_variables.len(),
            interventions = catalog.interventions.len(),
            "Loaded dashboard catalog"
        );

        Ok(catalog)
    }

    pub fn variables(&self, level: Level) -> &VariableCatalog {
        match level {
            Level::Block => &self.block_variables,
            Level::Gp => &self.gp_variables,
        }
    }

    /// The configured default when it exists, else the first listed intervention
    pub fn default_intervention(&self, configured: Option<&str>) -> Option<&str> {
        configured
            .and_then(|name| self.interventions.iter().find(|i| i.as_str() == name))
            .or_else(|| self.interventions.first())
            .map(String::as_str)
    }
}
