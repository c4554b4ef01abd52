//! Dashboard store
//!
//! Every transition runs to completion synchronously. Remote work is returned
//! as `Effect`s and comes back as `Event`s; classification responses carry the
//! generation they were issued under and older generations are discarded.

use std::collections::HashSet;
use std::sync::Arc;

use super::{Action, Catalog, ChartHandle, DetailKind, Effect, Event, MiniMapHandle, RenderCommand};
use crate::classify::{classify_response, ChoroplethScale};
use crate::error::{ErrorSeverity, LeafError, Result};
use crate::models::{
    ClassificationResult, FeatureId, FeatureLayer, FilterSet, LayerSchema, Level, VariableDescriptor, ViewState,
};
use crate::ports::{ExportRequest, FeasibilityRequest, RecommendationRequest};
use crate::url::{self, UrlHistory};

#[derive(Debug, Clone)]
pub struct DashboardStore {
    catalog: Arc<Catalog>,
    configured_intervention: Option<String>,
    view: ViewState,
    intervention: Option<String>,
    filters: FilterSet,
    filter_panel_open: bool,
    layer: FeatureLayer,
    classification: Option<ClassificationResult>,
    generation: u64,
    pending: Option<u64>,
    last_request: Option<(Level, FeasibilityRequest)>,
    choropleth: Option<ChoroplethScale>,
    block_options: Vec<String>,
    gp_options: Vec<String>,
    mini_map: Option<MiniMapHandle>,
    chart: Option<ChartHandle>,
    next_handle: u64,
    history: UrlHistory,
    alert: Option<String>,
    notices: Vec<String>,
}

impl DashboardStore {
    pub fn new(catalog: Arc<Catalog>, configured_intervention: Option<String>) -> Self {
        Self {
            catalog,
            configured_intervention,
            view: ViewState::default(),
            intervention: None,
            filters: FilterSet::new(),
            filter_panel_open: false,
            layer: FeatureLayer::empty(LayerSchema::block()),
            classification: None,
            generation: 0,
            pending: None,
            last_request: None,
            choropleth: None,
            block_options: Vec::new(),
            gp_options: Vec::new(),
            mini_map: None,
            chart: None,
            next_handle: 0,
            history: UrlHistory::new(),
            alert: None,
            notices: Vec::new(),
        }
    }

    /// First load: block layer, every block in the picker, default intervention filters
    pub fn initialize(&mut self) -> Vec<Effect> {
        self.block_options = self.catalog.hierarchy.block_names("");
        self.intervention = self.default_intervention();
        let mut effects = vec![Effect::LoadLayer { level: Level::Block }];
        if let Some(name) = &self.intervention {
            effects.push(Effect::LoadInterventionDefaults { name: name.clone() });
        }
        self.sync_url();
        effects
    }

    pub fn begin_hydration(&mut self) {
        self.view.in_initial_hydration = true;
        self.history.suppress();
    }

    /// Leave hydration and record the restored location as a single entry
    pub fn end_hydration(&mut self) {
        self.view.in_initial_hydration = false;
        self.history.resume();
        self.history.replace(self.current_path());
    }

    pub fn reduce(&mut self, action: Action) -> Result<Vec<Effect>> {
        tracing::debug!(?action, "Reducing action");
        match action {
            Action::SelectDistrict { name } => self.select_district(&name),
            Action::SelectBlock { name } => self.select_block(&name),
            Action::SelectGp { name } => self.select_gp(&name),
            Action::SelectFeature { feature_id } => self.select_feature(&feature_id),
            Action::BackToOverview => Ok(self.to_overview(true)),
            Action::ToggleVariable { field } => {
                if self.view.active_variable.as_deref() == Some(field.as_str()) {
                    self.clear_variable();
                } else {
                    self.view.active_variable = Some(field);
                    self.refresh_choropleth();
                }
                Ok(Vec::new())
            }
            Action::ClearVariable => {
                self.clear_variable();
                Ok(Vec::new())
            }
            Action::SelectIntervention { name } => self.select_intervention(name),
            Action::OpenFilterConfig => {
                if self.intervention.is_none() {
                    return Err(LeafError::InterventionNotSelected);
                }
                self.filter_panel_open = true;
                Ok(Vec::new())
            }
            Action::CloseFilterConfig => {
                self.filter_panel_open = false;
                Ok(Vec::new())
            }
            Action::ChangePreference { column, preference } => {
                self.filters.apply_preference_change(&column, preference)?;
                Ok(self.reclassify(false))
            }
            Action::AddVariable { field } => {
                let descriptor = self
                    .catalog
                    .variables(self.view.level)
                    .get(&field)
                    .cloned()
                    .ok_or(LeafError::FilterNotFound { column: field })?;
                if self.filters.add_variable(&descriptor) {
                    Ok(self.reclassify(false))
                } else {
                    Ok(Vec::new())
                }
            }
            Action::SetBounds { column, min, max } => {
                self.filters.set_bounds(&column, min, max)?;
                Ok(self.reclassify(false))
            }
            Action::SetWeight { column, weight } => {
                self.filters.set_weight(&column, weight)?;
                Ok(self.reclassify(false))
            }
            Action::SetLogic { logic } => {
                self.filters.set_logic(logic);
                Ok(self.reclassify(false))
            }
            Action::CommitGpSelection { included } => {
                let included: HashSet<String> = included.into_iter().collect();
                let descriptors: Vec<VariableDescriptor> =
                    self.catalog.variables(self.view.level).iter().cloned().collect();
                self.filters.commit_selection(&included, &descriptors);
                self.filter_panel_open = false;
                Ok(self.reclassify(false))
            }
            Action::DismissAlert => {
                self.alert = None;
                Ok(Vec::new())
            }
        }
    }

    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::LayerLoaded { level, collection } => {
                if level != self.view.level {
                    tracing::debug!(?level, current = ?self.view.level, "Discarding layer for inactive level");
                    return Vec::new();
                }
                self.layer = FeatureLayer::from_collection(&collection, LayerSchema::for_level(level));
                tracing::info!(?level, features = self.layer.len(), "Feature layer loaded");
                self.refresh_choropleth();
                Vec::new()
            }
            Event::GpPickerLoaded { listing } => {
                if listing.block != self.view.block
                    || (!listing.district.is_empty() && listing.district != self.view.district)
                {
                    tracing::debug!(block = %listing.block, "Discarding GP listing for inactive block");
                    return Vec::new();
                }
                let hierarchy = &self.catalog.hierarchy;
                let mut names: Vec<String> = listing
                    .gps
                    .into_iter()
                    .map(|gp| gp.name)
                    .filter(|name| hierarchy.gp(&self.view.district, &self.view.block, name).is_ok())
                    .collect();
                names.sort();
                names.dedup();
                if !names.is_empty() {
                    tracing::debug!(block = %listing.block, gps = names.len(), "GP picker refreshed");
                    self.gp_options = names;
                }
                Vec::new()
            }
            Event::GpPickerFailed { block, reason } => {
                tracing::warn!(%block, %reason, "Keeping cached GP picker");
                Vec::new()
            }
            Event::LayerFailed { level, reason } => {
                self.notice(format!("Could not load {level:?} boundaries: {reason}"));
                Vec::new()
            }
            Event::InterventionConfigLoaded { name, config } => {
                if self.intervention.as_deref() != Some(name.as_str()) {
                    tracing::debug!(intervention = %name, "Discarding config for inactive intervention");
                    return Vec::new();
                }
                if let Err(e) = self.filters.set_from_intervention_config(&config) {
                    self.report(&e);
                }
                self.retain_level_columns();
                tracing::info!(intervention = %name, filters = self.filters.len(), "Applied intervention defaults");
                self.reclassify(false)
            }
            Event::InterventionConfigFailed { name, reason } => {
                if self.intervention.as_deref() != Some(name.as_str()) {
                    return Vec::new();
                }
                self.filters.clear();
                self.report(&LeafError::MalformedConfig { reason: format!("{name}: {reason}") });
                self.reclassify(false)
            }
            Event::ClassificationLoaded { generation, response } => {
                if self.pending != Some(generation) {
                    tracing::warn!(generation, latest = self.generation, "Discarding stale classification response");
                    return Vec::new();
                }
                self.pending = None;
                let result = classify_response(
                    &response,
                    self.filters.filters(),
                    &LayerSchema::for_level(self.view.level),
                    generation,
                    self.filters.revision(),
                );
                tracing::info!(
                    generation,
                    features = result.features.len(),
                    total = result.distribution.total(),
                    "Classification applied"
                );
                let distribution = result.distribution.clone();
                self.classification = Some(result);
                self.render_chart(distribution)
            }
            Event::ClassificationFailed { generation, reason } => {
                if self.pending != Some(generation) {
                    tracing::warn!(generation, "Discarding stale classification failure");
                    return Vec::new();
                }
                self.pending = None;
                self.last_request = None;
                self.notice(format!("Feasibility calculation failed: {reason}"));
                Vec::new()
            }
        }
    }

    /// Record an error as a blocking alert or a dismissible notice
    pub fn report(&mut self, error: &LeafError) {
        match error.severity() {
            ErrorSeverity::Alert => {
                tracing::warn!(error = %error, "Raising alert");
                self.alert = Some(error.to_string());
            }
            ErrorSeverity::Logged => self.notice(error.to_string()),
        }
    }

    fn notice(&mut self, message: String) {
        tracing::error!(message = %message, "Dashboard error");
        self.notices.push(message);
    }

    fn select_district(&mut self, name: &str) -> Result<Vec<Effect>> {
        let catalog = Arc::clone(&self.catalog);
        if !name.is_empty() {
            catalog.hierarchy.district(name)?;
        }

        let mut effects = self.dispose_mini_map();
        self.view.district = name.to_string();
        self.view.block.clear();
        self.view.gp.clear();
        self.block_options = catalog.hierarchy.block_names(name);
        self.gp_options.clear();

        if self.view.level == Level::Gp {
            effects.extend(self.enter_block_level());
        } else {
            effects.extend(self.reclassify(false));
        }
        self.location_changed();
        Ok(effects)
    }

    fn select_block(&mut self, name: &str) -> Result<Vec<Effect>> {
        if name.is_empty() {
            return Ok(self.to_overview(false));
        }

        let district = if self.view.district.is_empty() {
            self.district_of_block(name)?
        } else {
            self.view.district.clone()
        };
        self.enter_block(&district, name)
    }

    fn district_of_block(&self, block: &str) -> Result<String> {
        self.catalog
            .hierarchy
            .district_of_block(block)
            .map(str::to_string)
            .ok_or_else(|| LeafError::BlockNotFound { district: String::new(), block: block.to_string() })
    }

    /// Show a block resolved against `district`; nothing changes if the block is unknown
    fn enter_block(&mut self, district: &str, name: &str) -> Result<Vec<Effect>> {
        self.catalog.hierarchy.block(district, name)?;
        let mut effects = self.set_block(district, name);
        if self.view.level == Level::Gp {
            match self.gp_options.first().cloned() {
                Some(first) => {
                    self.view.gp = first.clone();
                    effects.extend(self.show_mini_map(DetailKind::Gp, &first));
                }
                None => {
                    effects.extend(self.enter_block_level());
                    effects.extend(self.show_mini_map(DetailKind::Block, name));
                }
            }
        } else {
            effects.extend(self.show_mini_map(DetailKind::Block, name));
        }
        effects.extend(self.reclassify(false));
        self.location_changed();
        Ok(effects)
    }

    fn select_gp(&mut self, name: &str) -> Result<Vec<Effect>> {
        if name.is_empty() {
            return Ok(self.to_overview(false));
        }
        if self.view.block.is_empty() {
            return Err(LeafError::GpNotFound { block: String::new(), gp: name.to_string() });
        }

        let catalog = Arc::clone(&self.catalog);
        if !catalog.hierarchy.supports_gp(&self.view.district) {
            return Err(LeafError::GpDataUnavailable { district: self.view.district.clone() });
        }
        catalog.hierarchy.gp(&self.view.district, &self.view.block, name)?;

        let mut effects = Vec::new();
        if self.view.level != Level::Gp {
            effects.extend(self.enter_gp_level());
        }
        self.view.gp = name.to_string();
        effects.extend(self.show_mini_map(DetailKind::Gp, name));
        effects.extend(self.reclassify(false));
        self.location_changed();
        Ok(effects)
    }

    /// Map click: resolve the clicked feature to its block, and GP on GP layers
    fn select_feature(&mut self, id: &FeatureId) -> Result<Vec<Effect>> {
        let not_found = || LeafError::FeatureNotFound { feature_id: id.to_string() };
        let feature = self.layer.get(id).cloned().ok_or_else(not_found)?;
        let block = feature.block.clone().ok_or_else(not_found)?;

        let district = match feature.district {
            Some(district) if self.view.district.is_empty() || district == self.view.district => district,
            Some(_) => return Err(not_found()),
            None if self.view.district.is_empty() => self.district_of_block(&block)?,
            None => self.view.district.clone(),
        };

        match self.view.level {
            Level::Block => self.enter_block(&district, &block),
            Level::Gp => {
                let gp = feature.gp.ok_or_else(not_found)?;
                if !self.catalog.hierarchy.supports_gp(&district) {
                    return Err(LeafError::GpDataUnavailable { district });
                }
                self.catalog.hierarchy.gp(&district, &block, &gp)?;
                let mut effects = self.set_block(&district, &block);
                effects.extend(self.select_gp(&gp)?);
                Ok(effects)
            }
        }
    }

    /// Back to the overview panel; forced recomputation when requested
    fn to_overview(&mut self, force: bool) -> Vec<Effect> {
        let mut effects = self.dispose_mini_map();
        self.view.block.clear();
        self.view.gp.clear();
        self.gp_options.clear();
        self.block_options = self.catalog.hierarchy.block_names(&self.view.district);

        if self.view.level == Level::Gp {
            effects.extend(self.enter_block_level());
        } else {
            effects.extend(self.reclassify(force));
        }
        self.location_changed();
        effects
    }

    /// Move to a block; GP-capable districts also refresh the block's GP picker
    fn set_block(&mut self, district: &str, block: &str) -> Vec<Effect> {
        self.view.district = district.to_string();
        self.view.block = block.to_string();
        self.view.gp.clear();
        self.block_options = self.catalog.hierarchy.block_names(district);
        if !self.catalog.hierarchy.supports_gp(district) {
            self.gp_options.clear();
            return Vec::new();
        }
        self.gp_options = self.catalog.hierarchy.gp_names(district, block);
        vec![Effect::LoadGpPicker { block: block.to_string() }]
    }

    fn enter_block_level(&mut self) -> Vec<Effect> {
        tracing::info!("Switching to block level");
        self.view.level = Level::Block;
        self.view.gp.clear();
        self.layer = FeatureLayer::empty(LayerSchema::block());
        self.drop_foreign_variable();
        self.filters.clear();

        let mut effects = vec![Effect::LoadLayer { level: Level::Block }];
        effects.extend(self.reclassify(false));
        self.intervention = self.default_intervention();
        if let Some(name) = &self.intervention {
            effects.push(Effect::LoadInterventionDefaults { name: name.clone() });
        }
        effects
    }

    fn enter_gp_level(&mut self) -> Vec<Effect> {
        tracing::info!(district = %self.view.district, "Switching to gram-panchayat level");
        self.view.level = Level::Gp;
        self.layer = FeatureLayer::empty(LayerSchema::gp());
        self.drop_foreign_variable();
        self.retain_level_columns();
        vec![Effect::LoadLayer { level: Level::Gp }]
    }

    /// Drop filters on columns the current level has no variable for
    fn retain_level_columns(&mut self) {
        let variables = self.catalog.variables(self.view.level);
        if variables.is_empty() {
            return;
        }
        let keep: HashSet<String> = self
            .filters
            .columns()
            .into_iter()
            .filter(|c| variables.get(c).is_some())
            .map(str::to_string)
            .collect();
        if keep.len() != self.filters.len() {
            tracing::debug!(kept = keep.len(), dropped = self.filters.len() - keep.len(), "Dropping filters for other level");
            self.filters.commit_selection(&keep, &[]);
        }
    }

    fn drop_foreign_variable(&mut self) {
        let variables = self.catalog.variables(self.view.level);
        let foreign = matches!(&self.view.active_variable, Some(field) if !variables.is_empty() && variables.get(field).is_none());
        if foreign {
            self.clear_variable();
        } else {
            self.refresh_choropleth();
        }
    }

    fn select_intervention(&mut self, name: String) -> Result<Vec<Effect>> {
        if !self.catalog.interventions.contains(&name) {
            return Err(LeafError::InterventionNotFound { name });
        }
        tracing::info!(intervention = %name, "Selecting intervention");
        self.intervention = Some(name.clone());
        Ok(vec![Effect::LoadInterventionDefaults { name }])
    }

    fn clear_variable(&mut self) {
        self.view.active_variable = None;
        self.choropleth = None;
    }

    /// Rescale over the features visible in the current scope
    fn refresh_choropleth(&mut self) {
        let view = &self.view;
        self.choropleth = view.active_variable.as_deref().map(|field| {
            ChoroplethScale::for_features(field, self.layer.visible(&view.district, &view.block, &view.gp))
        });
    }

    /// The location scope moved
    fn location_changed(&mut self) {
        self.refresh_choropleth();
        self.sync_url();
    }

    /// Issue a classification for the current filters unless an identical one is current
    ///
    /// An empty filter set clears the result and invalidates anything in flight.
    fn reclassify(&mut self, force: bool) -> Vec<Effect> {
        if self.filters.is_empty() {
            if self.classification.is_none() && self.pending.is_none() {
                return Vec::new();
            }
            self.generation += 1;
            self.pending = None;
            self.last_request = None;
            self.classification = None;
            return self.dispose_chart();
        }

        let key = (self.view.level, self.feasibility_request());
        if !force && self.last_request.as_ref() == Some(&key) {
            // Same request as the shown result: it is current for this revision too
            if self.pending.is_none() {
                let revision = self.filters.revision();
                if let Some(result) = self.classification.as_mut() {
                    result.filter_revision = revision;
                }
            }
            return Vec::new();
        }

        self.generation += 1;
        self.pending = Some(self.generation);
        self.last_request = Some(key.clone());
        tracing::debug!(generation = self.generation, filters = self.filters.len(), "Requesting classification");
        vec![Effect::Classify { generation: self.generation, level: key.0, request: key.1 }]
    }

    pub fn feasibility_request(&self) -> FeasibilityRequest {
        FeasibilityRequest {
            intervention: self.intervention.clone(),
            filters: self.filters.filters().to_vec(),
            logic: self.filters.logic(),
            district: non_empty(&self.view.district),
            block: match self.view.level {
                Level::Gp => non_empty(&self.view.block),
                Level::Block => None,
            },
        }
    }

    pub fn export_request(&self) -> ExportRequest {
        ExportRequest {
            intervention: self.intervention.clone(),
            filters: self.filters.filters().to_vec(),
            logic: self.filters.logic(),
        }
    }

    pub fn recommendation_request(&self) -> RecommendationRequest {
        RecommendationRequest {
            intervention: self.intervention.clone(),
            district: non_empty(&self.view.district),
            block: non_empty(&self.view.block),
            filters: self.filters.filters().to_vec(),
        }
    }

    fn next_handle_id(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn dispose_mini_map(&mut self) -> Vec<Effect> {
        self.mini_map
            .take()
            .map(|handle| Effect::Render(RenderCommand::DisposeMiniMap { handle }))
            .into_iter()
            .collect()
    }

    /// Dispose the live mini-map, if any, before creating its replacement
    fn show_mini_map(&mut self, kind: DetailKind, name: &str) -> Vec<Effect> {
        let mut effects = self.dispose_mini_map();
        let handle = MiniMapHandle { id: self.next_handle_id(), kind, name: name.to_string() };
        self.mini_map = Some(handle.clone());
        effects.push(Effect::Render(RenderCommand::CreateMiniMap { handle }));
        effects
    }

    fn dispose_chart(&mut self) -> Vec<Effect> {
        self.chart
            .take()
            .map(|handle| Effect::Render(RenderCommand::DisposeChart { handle }))
            .into_iter()
            .collect()
    }

    fn render_chart(&mut self, distribution: crate::models::Distribution) -> Vec<Effect> {
        let mut effects = self.dispose_chart();
        let handle = ChartHandle { id: self.next_handle_id() };
        self.chart = Some(handle);
        effects.push(Effect::Render(RenderCommand::RenderChart { handle, distribution }));
        effects
    }

    fn default_intervention(&self) -> Option<String> {
        self.catalog.default_intervention(self.configured_intervention.as_deref()).map(str::to_string)
    }

    fn sync_url(&mut self) {
        let path = self.current_path();
        self.history.push(path);
    }

    pub fn current_path(&self) -> String {
        url::to_path(&self.view)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn intervention(&self) -> Option<&str> {
        self.intervention.as_deref()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn filter_panel_open(&self) -> bool {
        self.filter_panel_open
    }

    pub fn layer(&self) -> &FeatureLayer {
        &self.layer
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// The shown classification was computed from an older filter revision
    pub fn is_stale(&self) -> bool {
        self.classification
            .as_ref()
            .is_some_and(|c| c.filter_revision != self.filters.revision())
    }

    pub fn choropleth(&self) -> Option<&ChoroplethScale> {
        self.choropleth.as_ref()
    }

    pub fn block_options(&self) -> &[String] {
        &self.block_options
    }

    pub fn gp_options(&self) -> &[String] {
        &self.gp_options
    }

    pub fn mini_map(&self) -> Option<&MiniMapHandle> {
        self.mini_map.as_ref()
    }

    pub fn chart(&self) -> Option<ChartHandle> {
        self.chart
    }

    pub fn history(&self) -> &UrlHistory {
        &self.history
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::FeasibilityResponse;
    use crate::models::{
        BlockRow, DistrictNode, GpLocation, LevelsInfo, LocationHierarchy, LocationListing, Panel, Preference,
        VariableCatalog,
    };
    use crate::ports::{GpBlockListing, GpSummary};
    use serde_json::json;

    fn catalog() -> Arc<Catalog> {
        let listing = LocationListing {
            blocks: vec![
                BlockRow { block_name: "Margherita".into(), district: "Tinsukia".into() },
                BlockRow { block_name: "Kakopathar".into(), district: "Tinsukia".into() },
                BlockRow { block_name: "Khowang".into(), district: "Dibrugarh".into() },
            ],
            districts: vec![DistrictNode { name: "Dibrugarh".into(), has_gp_data: false, blocks: vec![] }],
        };
        let gps = vec![
            GpLocation { name: "Bogapani".into(), code: None, block: "Margherita".into(), district: "Tinsukia".into() },
            GpLocation { name: "Bahbari".into(), code: None, block: "Margherita".into(), district: "Tinsukia".into() },
        ];
        let variable = |field: &str| VariableDescriptor {
            field: field.into(),
            label: field.into(),
            description: String::new(),
            group: "Other".into(),
            data_min: 0.0,
            data_max: 100.0,
            data_mean: 50.0,
        };
        Arc::new(Catalog {
            hierarchy: LocationHierarchy::build(&listing, &LevelsInfo::default(), &gps),
            block_variables: VariableCatalog::new(vec![variable("rainfall"), variable("slope")]),
            gp_variables: VariableCatalog::new(vec![variable("wells")]),
            interventions: vec!["Farm Ponds".into(), "Check Dams".into()],
        })
    }

    fn store() -> DashboardStore {
        let mut store = DashboardStore::new(catalog(), None);
        store.initialize();
        store
    }

    fn config() -> serde_json::Value {
        json!({
            "name": "Farm Ponds",
            "variables": [{"field": "rainfall", "label": "Rainfall", "range_min": 10.0, "range_max": 80.0,
                           "data_min": 0.0, "data_max": 100.0, "data_mean": 50.0}]
        })
    }

    fn response() -> Box<FeasibilityResponse> {
        Box::new(
            serde_json::from_value(json!({
                "geojson": {"type": "FeatureCollection", "features": [{
                    "type": "Feature", "geometry": null,
                    "properties": {"Dist_Name": "Tinsukia", "Block_name": "Margherita", "feasibility": 80.0}
                }]},
                "statistics": {}
            }))
            .unwrap(),
        )
    }

    fn classify_effect(effects: &[Effect]) -> Option<u64> {
        effects.iter().find_map(|e| match e {
            Effect::Classify { generation, .. } => Some(*generation),
            _ => None,
        })
    }

    #[test]
    fn test_initialize_loads_default_intervention() {
        let mut store = DashboardStore::new(catalog(), Some("Check Dams".into()));
        let effects = store.initialize();
        assert_eq!(store.intervention(), Some("Check Dams"));
        assert!(effects.contains(&Effect::LoadLayer { level: Level::Block }));
        assert!(effects.contains(&Effect::LoadInterventionDefaults { name: "Check Dams".into() }));
        assert_eq!(store.block_options().len(), 3);
        assert_eq!(store.history().entries(), ["/".to_string()]);
    }

    #[test]
    fn test_select_district_scopes_blocks() {
        let mut store = store();
        store.reduce(Action::SelectDistrict { name: "Tinsukia".into() }).unwrap();
        assert_eq!(store.block_options(), ["Kakopathar".to_string(), "Margherita".to_string()]);
        assert_eq!(store.view().panel(), Panel::Overview);
        assert_eq!(store.current_path(), "/Tinsukia");
    }

    #[test]
    fn test_unknown_district_is_rejected() {
        let mut store = store();
        let err = store.reduce(Action::SelectDistrict { name: "Nowhere".into() }).unwrap_err();
        assert!(matches!(err, LeafError::DistrictNotFound { .. }));
        assert!(store.view().district.is_empty());
    }

    #[test]
    fn test_select_block_infers_district() {
        let mut store = store();
        store.reduce(Action::SelectBlock { name: "Khowang".into() }).unwrap();
        assert_eq!(store.view().district, "Dibrugarh");
        assert_eq!(store.view().panel(), Panel::BlockDetail);
        assert!(store.gp_options().is_empty());
    }

    #[test]
    fn test_block_without_gp_data_skips_picker_load() {
        let mut store = store();
        let effects = store.reduce(Action::SelectBlock { name: "Khowang".into() }).unwrap();
        assert!(!effects.iter().any(|e| matches!(e, Effect::LoadGpPicker { .. })));
    }

    #[test]
    fn test_mini_map_disposed_before_create() {
        let mut store = store();
        store.reduce(Action::SelectBlock { name: "Margherita".into() }).unwrap();
        let first = store.mini_map().cloned().unwrap();

        let effects = store.reduce(Action::SelectBlock { name: "Kakopathar".into() }).unwrap();
        let renders: Vec<&RenderCommand> = effects
            .iter()
            .filter_map(|e| match e {
                Effect::Render(cmd) => Some(cmd),
                _ => None,
            })
            .collect();
        assert_eq!(renders.len(), 2);
        assert_eq!(renders[0], &RenderCommand::DisposeMiniMap { handle: first });
        assert!(matches!(renders[1], RenderCommand::CreateMiniMap { handle } if handle.name == "Kakopathar"));
    }

    #[test]
    fn test_gp_level_round_trip() {
        let mut store = store();
        store.reduce(Action::SelectDistrict { name: "Tinsukia".into() }).unwrap();
        store.reduce(Action::SelectBlock { name: "Margherita".into() }).unwrap();
        assert_eq!(store.gp_options(), ["Bahbari".to_string(), "Bogapani".to_string()]);

        let effects = store.reduce(Action::SelectGp { name: "Bogapani".into() }).unwrap();
        assert!(effects.contains(&Effect::LoadLayer { level: Level::Gp }));
        assert_eq!(store.view().level, Level::Gp);
        assert_eq!(store.view().panel(), Panel::GpDetail);
        assert_eq!(store.current_path(), "/Tinsukia/Margherita/Bogapani");

        let effects = store.reduce(Action::BackToOverview).unwrap();
        assert_eq!(store.view().level, Level::Block);
        assert!(effects.contains(&Effect::LoadLayer { level: Level::Block }));
        assert!(effects.contains(&Effect::LoadInterventionDefaults { name: "Farm Ponds".into() }));
        assert!(store.mini_map().is_none());
    }

    #[test]
    fn test_gp_requires_gp_district() {
        let mut store = store();
        store.reduce(Action::SelectBlock { name: "Khowang".into() }).unwrap();
        let err = store.reduce(Action::SelectGp { name: "Bogapani".into() }).unwrap_err();
        assert!(matches!(err, LeafError::GpDataUnavailable { .. }));
    }

    #[test]
    fn test_open_filter_config_requires_intervention() {
        let mut store = DashboardStore::new(Arc::new(Catalog::default()), None);
        store.initialize();
        let err = store.reduce(Action::OpenFilterConfig).unwrap_err();
        assert_eq!(err.severity(), ErrorSeverity::Alert);
        store.report(&err);
        assert!(store.alert().is_some());
        assert!(!store.filter_panel_open());
    }

    #[test]
    fn test_malformed_config_raises_alert() {
        let mut store = store();
        store.apply(Event::InterventionConfigLoaded {
            name: "Farm Ponds".into(),
            config: json!({"variables": 3}),
        });
        assert!(store.filters().is_empty());
        assert!(store.alert().is_some());
    }

    #[test]
    fn test_stale_classification_is_discarded() {
        let mut store = store();
        let effects = store.apply(Event::InterventionConfigLoaded { name: "Farm Ponds".into(), config: config() });
        let first = classify_effect(&effects).unwrap();

        let effects = store
            .reduce(Action::ChangePreference { column: "rainfall".into(), preference: Preference::Lower })
            .unwrap();
        let second = classify_effect(&effects).unwrap();
        assert!(second > first);

        assert!(store.apply(Event::ClassificationLoaded { generation: first, response: response() }).is_empty());
        assert!(store.classification().is_none());
        assert!(store.is_loading());

        let effects = store.apply(Event::ClassificationLoaded { generation: second, response: response() });
        assert!(matches!(effects.as_slice(), [Effect::Render(RenderCommand::RenderChart { .. })]));
        assert_eq!(store.classification().unwrap().generation, second);
        assert!(!store.is_loading());
        assert!(!store.is_stale());
    }

    #[test]
    fn test_identical_request_is_not_reissued() {
        let mut store = store();
        store.apply(Event::InterventionConfigLoaded { name: "Farm Ponds".into(), config: config() });
        let effects = store.reduce(Action::SelectBlock { name: "Margherita".into() }).unwrap();
        assert!(classify_effect(&effects).is_some(), "district narrowing changes the request");

        let effects = store.reduce(Action::SelectBlock { name: "Kakopathar".into() }).unwrap();
        assert!(classify_effect(&effects).is_none());

        let effects = store.reduce(Action::BackToOverview).unwrap();
        assert!(classify_effect(&effects).is_some());
    }

    #[test]
    fn test_unchanged_filter_edit_keeps_result_current() {
        let mut store = store();
        let effects = store.apply(Event::InterventionConfigLoaded { name: "Farm Ponds".into(), config: config() });
        let generation = classify_effect(&effects).unwrap();
        store.apply(Event::ClassificationLoaded { generation, response: response() });
        assert!(!store.is_stale());

        let logic = store.filters().logic();
        let effects = store.reduce(Action::SetLogic { logic }).unwrap();
        assert!(classify_effect(&effects).is_none());

        let (min, max) = store.filters().get("rainfall").map(|f| (f.min_val, f.max_val)).unwrap();
        let effects = store.reduce(Action::SetBounds { column: "rainfall".into(), min, max }).unwrap();
        assert!(classify_effect(&effects).is_none());

        assert!(!store.is_loading());
        assert!(!store.is_stale());
    }

    #[test]
    fn test_failed_map_click_leaves_view_unchanged() {
        let mut store = store();
        let collection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [{"type": "Feature", "id": "ghost", "geometry": null,
                          "properties": {"Dist_Name": "Tinsukia", "Block_name": "Ghost"}}]
        }))
        .unwrap();
        store.apply(Event::LayerLoaded { level: Level::Block, collection });

        let err = store.reduce(Action::SelectFeature { feature_id: FeatureId("ghost".into()) }).unwrap_err();
        assert!(matches!(err, LeafError::BlockNotFound { .. }));
        assert!(store.view().district.is_empty());
        assert!(store.view().block.is_empty());
        assert_eq!(store.current_path(), "/");
        assert_eq!(store.history().entries(), ["/".to_string()]);
        assert_eq!(store.block_options().len(), 3);
        assert!(store.mini_map().is_none());
    }

    #[test]
    fn test_gp_picker_refreshed_from_block_listing() {
        let mut store = store();
        store.reduce(Action::SelectDistrict { name: "Tinsukia".into() }).unwrap();
        let effects = store.reduce(Action::SelectBlock { name: "Margherita".into() }).unwrap();
        assert!(effects.contains(&Effect::LoadGpPicker { block: "Margherita".into() }));

        let summary = |name: &str| GpSummary { name: name.into(), code: None, village_count: 3 };
        store.apply(Event::GpPickerLoaded {
            listing: GpBlockListing {
                block: "Margherita".into(),
                district: "Tinsukia".into(),
                gps: vec![summary("Bogapani"), summary("Unmapped")],
            },
        });
        assert_eq!(store.gp_options(), ["Bogapani".to_string()]);

        // Late listing for another block
        store.apply(Event::GpPickerLoaded {
            listing: GpBlockListing { block: "Kakopathar".into(), district: "Tinsukia".into(), gps: vec![summary("Bahbari")] },
        });
        assert_eq!(store.gp_options(), ["Bogapani".to_string()]);

        store.apply(Event::GpPickerFailed { block: "Margherita".into(), reason: "timeout".into() });
        assert_eq!(store.gp_options(), ["Bogapani".to_string()]);
        assert!(store.notices().is_empty());
    }

    #[test]
    fn test_choropleth_toggle_is_idempotent() {
        let mut store = store();
        store.reduce(Action::ToggleVariable { field: "rainfall".into() }).unwrap();
        assert_eq!(store.choropleth().map(|c| c.field.as_str()), Some("rainfall"));
        store.reduce(Action::ToggleVariable { field: "rainfall".into() }).unwrap();
        assert!(store.choropleth().is_none());
        assert!(store.view().active_variable.is_none());
    }

    #[test]
    fn test_choropleth_rescales_with_scope() {
        let mut store = store();
        let collection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": null,
                 "properties": {"Dist_Name": "Tinsukia", "Block_name": "Margherita", "rainfall": 10.0}},
                {"type": "Feature", "geometry": null,
                 "properties": {"Dist_Name": "Tinsukia", "Block_name": "Kakopathar", "rainfall": 20.0}},
                {"type": "Feature", "geometry": null,
                 "properties": {"Dist_Name": "Dibrugarh", "Block_name": "Khowang", "rainfall": 100.0}}
            ]
        }))
        .unwrap();
        store.apply(Event::LayerLoaded { level: Level::Block, collection });
        store.reduce(Action::ToggleVariable { field: "rainfall".into() }).unwrap();
        assert_eq!(store.choropleth().map(|c| (c.min, c.max)), Some((10.0, 100.0)));

        store.reduce(Action::SelectDistrict { name: "Tinsukia".into() }).unwrap();
        assert_eq!(store.choropleth().map(|c| (c.min, c.max)), Some((10.0, 20.0)));

        // A single visible value widens to a unit range
        store.reduce(Action::SelectBlock { name: "Kakopathar".into() }).unwrap();
        assert_eq!(store.choropleth().map(|c| (c.min, c.max)), Some((20.0, 21.0)));
    }

    #[test]
    fn test_hydration_writes_single_entry() {
        let mut store = DashboardStore::new(catalog(), None);
        store.begin_hydration();
        store.initialize();
        store.reduce(Action::SelectDistrict { name: "Tinsukia".into() }).unwrap();
        store.reduce(Action::SelectBlock { name: "Margherita".into() }).unwrap();
        assert!(store.history().is_empty());
        store.end_hydration();
        assert_eq!(store.history().entries(), ["/Tinsukia/Margherita".to_string()]);
        assert!(!store.view().in_initial_hydration);
    }
}
