use std::sync::Arc;

use leafmap_core::config::LayeredConfig;
use leafmap_core::ports::ScoringService;
use leafmap_core::state::Action;
use leafmap_core::{Catalog, Result, Session};

/// Shared server state; each request replays its own session on top of it
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn ScoringService>,
    pub catalog: Arc<Catalog>,
    pub config: LayeredConfig,
}

impl AppState {
    pub fn new(service: Arc<dyn ScoringService>, catalog: Arc<Catalog>, config: LayeredConfig) -> Self {
        Self { service, catalog, config }
    }

    /// Load the catalog once from the service
    pub async fn load(service: Arc<dyn ScoringService>, config: LayeredConfig) -> Result<Self> {
        let catalog = Catalog::load(service.as_ref()).await?;
        tracing::info!(
            districts = catalog.hierarchy.districts().len(),
            interventions = catalog.interventions.len(),
            "Catalog loaded"
        );
        Ok(Self::new(service, Arc::new(catalog), config))
    }

    pub fn session(&self) -> Session {
        Session::new(Arc::clone(&self.service), Arc::clone(&self.catalog), &self.config)
    }

    /// Hydrate `path` and apply `actions` in order on a fresh session
    pub async fn replay(&self, path: &str, actions: Vec<Action>) -> Result<Session> {
        let mut session = self.session();
        session.hydrate(path).await?;
        for action in actions {
            session.dispatch(action).await?;
        }
        Ok(session)
    }
}
