//! Dashboard session runtime
//!
//! Drives a `DashboardStore` against a `ScoringService`: reduces actions, runs
//! the returned effects in order and feeds their results back as events.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::LayeredConfig;
use crate::error::{LeafError, Result};
use crate::models::Level;
use crate::ports::{Recommendation, ScoringService};
use crate::presenter::ViewModel;
use crate::state::{Action, Catalog, DashboardStore, Effect, Event, RenderCommand};
use crate::url::ViewPath;

pub struct Session {
    service: Arc<dyn ScoringService>,
    catalog: Arc<Catalog>,
    default_intervention: Option<String>,
    timeout: Option<Duration>,
    store: DashboardStore,
    render_log: Vec<RenderCommand>,
}

impl Session {
    pub fn new(service: Arc<dyn ScoringService>, catalog: Arc<Catalog>, config: &LayeredConfig) -> Self {
        let default_intervention = config.default_intervention.value.clone();
        Self {
            store: DashboardStore::new(Arc::clone(&catalog), default_intervention.clone()),
            service,
            catalog,
            default_intervention,
            timeout: config.request_timeout(),
            render_log: Vec::new(),
        }
    }

    /// Load the catalog from the service and start a session at the root view
    pub async fn bootstrap(service: Arc<dyn ScoringService>, config: &LayeredConfig) -> Result<Self> {
        let catalog = Arc::new(Catalog::load(service.as_ref()).await?);
        let mut session = Self::new(service, catalog, config);
        session.start().await;
        Ok(session)
    }

    /// Initial load of the root view
    pub async fn start(&mut self) {
        let effects = self.store.initialize();
        self.run(effects).await;
    }

    /// Restore the view addressed by `path` on a fresh dashboard
    ///
    /// Replay stops at the first segment that does not resolve; the view keeps
    /// the deepest valid location and the error is returned.
    pub async fn hydrate(&mut self, path: &str) -> Result<()> {
        let target = match ViewPath::parse(path) {
            Ok(target) => target,
            Err(e) => {
                self.store.report(&e);
                self.start().await;
                return Err(e);
            }
        };

        tracing::info!(path = %path, level = ?target.level(), "Hydrating dashboard");
        self.store.begin_hydration();
        let effects = self.store.initialize();
        self.run(effects).await;

        let mut outcome = Ok(());
        for action in target.replay_actions() {
            if let Err(e) = self.dispatch(action).await {
                tracing::warn!(path = %path, error = %e, "Stopping hydration");
                outcome = Err(e);
                break;
            }
        }
        self.store.end_hydration();
        outcome
    }

    /// Back/forward navigation: reset and replay the new location
    pub async fn navigate(&mut self, path: &str) -> Result<()> {
        self.reset();
        self.hydrate(path).await
    }

    fn reset(&mut self) {
        self.store = DashboardStore::new(Arc::clone(&self.catalog), self.default_intervention.clone());
        self.render_log.clear();
    }

    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        match self.store.reduce(action) {
            Ok(effects) => {
                self.run(effects).await;
                Ok(())
            }
            Err(e) => {
                self.store.report(&e);
                Err(e)
            }
        }
    }

    async fn run(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            let follow_up = match effect {
                Effect::Render(command) => {
                    self.render_log.push(command);
                    Vec::new()
                }
                Effect::LoadLayer { level } => {
                    let endpoint = layer_endpoint(level);
                    let event = match self.call(endpoint, self.service.feature_layer(level)).await {
                        Ok(collection) => Event::LayerLoaded { level, collection },
                        Err(e) => Event::LayerFailed { level, reason: e.to_string() },
                    };
                    self.store.apply(event)
                }
                Effect::LoadInterventionDefaults { name } => {
                    let event = match self.call("/intervention/config", self.service.intervention_config(&name)).await {
                        Ok(config) => Event::InterventionConfigLoaded { name, config },
                        Err(e) => Event::InterventionConfigFailed { name, reason: e.to_string() },
                    };
                    self.store.apply(event)
                }
                Effect::LoadGpPicker { block } => {
                    let event = match self.call("/gp/block", self.service.gp_block(&block)).await {
                        Ok(listing) => Event::GpPickerLoaded { listing },
                        Err(e) => Event::GpPickerFailed { block, reason: e.to_string() },
                    };
                    self.store.apply(event)
                }
                Effect::Classify { generation, level, request } => {
                    let endpoint = classify_endpoint(level);
                    let event = match self.call(endpoint, self.service.calculate_feasibility(level, &request)).await {
                        Ok(response) => Event::ClassificationLoaded { generation, response: Box::new(response) },
                        Err(e) => Event::ClassificationFailed { generation, reason: e.to_string() },
                    };
                    self.store.apply(event)
                }
            };
            queue.extend(follow_up);
        }
    }

    async fn call<T, F>(&self, endpoint: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, future).await.map_err(|_| LeafError::Timeout {
                endpoint: endpoint.to_string(),
                secs: limit.as_secs(),
            })?,
            None => future.await,
        };
        if let Err(e) = &result {
            tracing::error!(endpoint, error = %e, "Scoring service call failed");
        }
        result
    }

    /// CSV of the current filter set
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let request = self.store.export_request();
        self.call("/export/csv", self.service.export_csv(&request)).await
    }

    pub async fn recommendation(&self) -> Result<Recommendation> {
        let request = self.store.recommendation_request();
        self.call("/ai-recommendation", self.service.recommendation(&request)).await
    }

    pub fn view_model(&self) -> ViewModel {
        ViewModel::from_store(&self.store)
    }

    pub fn store(&self) -> &DashboardStore {
        &self.store
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Render commands applied so far, in order
    pub fn render_log(&self) -> &[RenderCommand] {
        &self.render_log
    }

    pub fn take_render_log(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.render_log)
    }
}

fn layer_endpoint(level: Level) -> &'static str {
    match level {
        Level::Block => "/blocks/geojson",
        Level::Gp => "/gp/geojson",
    }
}

fn classify_endpoint(level: Level) -> &'static str {
    match level {
        Level::Block => "/calculate-feasibility",
        Level::Gp => "/gp/calculate-feasibility",
    }
}
