//! Declarative view model
//!
//! Everything the rendering adapter needs is derived here from the store; the
//! adapter never reads store internals.

use serde::{Deserialize, Serialize};

use crate::classify::{ChoroplethScale, LegendEntry};
use crate::geo::{feature_bounds, union_bounds, Bounds};
use crate::models::{
    ClassificationResult, Distribution, DistributionBucket, FeasibilityLabel, FeasibilityStatistics, FeatureId,
    FeatureLayer, Filter, FilterLogic, Level, MapFeature, Panel, ViewState, NO_DATA_COLOR,
};
use crate::state::{ChartHandle, DashboardStore, DetailKind, MiniMapHandle};

const VISIBLE_FILL_OPACITY: f64 = 0.7;
const VISIBLE_STROKE_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStyle {
    pub feature_id: FeatureId,
    pub fill_color: String,
    pub fill_opacity: f64,
    pub stroke_opacity: f64,
    pub stroke_weight: f64,
    pub visible: bool,
    /// Hover text
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ColorMode {
    /// No classification yet; every feature uses the no-data fill
    Base,
    Feasibility,
    Choropleth { field: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyling {
    pub level: Level,
    pub mode: ColorMode,
    pub styles: Vec<FeatureStyle>,
    /// Bounds to fit; `None` leaves the viewport unchanged
    pub viewport: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricCard {
    pub field: String,
    pub label: String,
    pub value: Option<f64>,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiniMapView {
    pub handle: MiniMapHandle,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailView {
    pub kind: DetailKind,
    pub title: String,
    pub subtitle: String,
    pub feasibility: Option<FeasibilityLabel>,
    pub feasibility_score: Option<f64>,
    pub metrics: Vec<MetricCard>,
    pub mini_map: Option<MiniMapView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterView {
    #[serde(flatten)]
    pub filter: Filter,
    pub min_editable: bool,
    pub max_editable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickerView {
    pub districts: Vec<String>,
    pub blocks: Vec<String>,
    pub gps: Vec<String>,
    pub show_gp: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub url: String,
    pub history: Vec<String>,
    pub panel: Panel,
    pub view: ViewState,
    pub pickers: PickerView,
    pub intervention: Option<String>,
    pub interventions: Vec<String>,
    pub filter_panel_open: bool,
    pub logic: FilterLogic,
    pub filters: Vec<FilterView>,
    pub styling: LayerStyling,
    pub legend: Legend,
    pub distribution: Option<Distribution>,
    pub statistics: Option<FeasibilityStatistics>,
    pub detail: Option<DetailView>,
    pub chart: Option<ChartHandle>,
    pub loading: bool,
    pub stale: bool,
    pub alert: Option<String>,
    pub notices: Vec<String>,
}

impl ViewModel {
    pub fn from_store(store: &DashboardStore) -> Self {
        let view = store.view().clone();
        let classification = store.classification();
        let choropleth = store.choropleth();
        let catalog = store.catalog();

        let filters = store
            .filters()
            .filters()
            .iter()
            .map(|f| FilterView { filter: f.clone(), min_editable: f.min_editable(), max_editable: f.max_editable() })
            .collect();

        let pickers = PickerView {
            districts: catalog.hierarchy.districts().iter().map(|d| d.name.clone()).collect(),
            blocks: store.block_options().to_vec(),
            gps: store.gp_options().to_vec(),
            show_gp: !view.district.is_empty() && catalog.hierarchy.supports_gp(&view.district),
        };

        let legend = match choropleth {
            Some(scale) => Legend { title: catalog.variables(view.level).label(&scale.field).to_string(), entries: scale.legend() },
            None => feasibility_legend(),
        };

        Self {
            url: store.current_path(),
            history: store.history().entries().to_vec(),
            panel: view.panel(),
            pickers,
            intervention: store.intervention().map(str::to_string),
            interventions: catalog.interventions.clone(),
            filter_panel_open: store.filter_panel_open(),
            logic: store.filters().logic(),
            filters,
            styling: style_layer(store.layer(), &view, classification, choropleth),
            legend,
            distribution: classification.map(|c| c.distribution.clone()),
            statistics: classification.map(|c| c.statistics.clone()),
            detail: detail_view(store),
            chart: store.chart(),
            loading: store.is_loading(),
            stale: store.is_stale(),
            alert: store.alert().map(str::to_string),
            notices: store.notices().to_vec(),
            view,
        }
    }
}

/// Restyle every feature of the layer for the current scope and color mode
pub fn style_layer(
    layer: &FeatureLayer,
    view: &ViewState,
    classification: Option<&ClassificationResult>,
    choropleth: Option<&ChoroplethScale>,
) -> LayerStyling {
    let mode = match (choropleth, classification) {
        (Some(scale), _) => ColorMode::Choropleth { field: scale.field.clone() },
        (None, Some(_)) => ColorMode::Feasibility,
        (None, None) => ColorMode::Base,
    };

    let styles = layer
        .features()
        .iter()
        .map(|feature| {
            let visible = feature.in_scope(&view.district, &view.block, &view.gp);
            let (fill_color, tooltip) = match (choropleth, classification) {
                (Some(scale), _) => {
                    let value = feature.numeric(&scale.field);
                    (scale.color(value).to_string(), format_metric(value))
                }
                (None, Some(result)) => match result.get(&feature.id) {
                    Some(c) => (c.feasibility_color.clone(), c.feasibility_label.bucket().display().to_string()),
                    None => (NO_DATA_COLOR.to_string(), DistributionBucket::NoData.display().to_string()),
                },
                (None, None) => (NO_DATA_COLOR.to_string(), String::new()),
            };
            FeatureStyle {
                feature_id: feature.id.clone(),
                fill_color,
                fill_opacity: if visible { VISIBLE_FILL_OPACITY } else { 0.0 },
                stroke_opacity: if visible { 1.0 } else { 0.0 },
                stroke_weight: if visible { VISIBLE_STROKE_WEIGHT } else { 0.0 },
                visible,
                tooltip: format!("{}{}{}", feature_title(feature), if tooltip.is_empty() { "" } else { ": " }, tooltip),
            }
        })
        .collect();

    LayerStyling { level: layer.level(), mode, styles, viewport: viewport(layer, view) }
}

/// Fit the visible features; with nothing visible, the whole dataset at the top level only
fn viewport(layer: &FeatureLayer, view: &ViewState) -> Option<Bounds> {
    union_bounds(layer.visible(&view.district, &view.block, &view.gp)).or_else(|| {
        if view.district.is_empty() {
            union_bounds(layer.features())
        } else {
            None
        }
    })
}

fn feasibility_legend() -> Legend {
    Legend {
        title: "Feasibility".to_string(),
        entries: FeasibilityLabel::ALL
            .iter()
            .map(|label| LegendEntry {
                label: label.bucket().display().to_string(),
                lower: None,
                upper: None,
                color: label.color().to_string(),
            })
            .collect(),
    }
}

fn detail_view(store: &DashboardStore) -> Option<DetailView> {
    let view = store.view();
    let (kind, title, subtitle) = match view.panel() {
        Panel::Overview => return None,
        Panel::BlockDetail => (DetailKind::Block, view.block.clone(), format!("{} district", view.district)),
        Panel::GpDetail => (DetailKind::Gp, view.gp.clone(), format!("{} block, {} district", view.block, view.district)),
    };

    let gp = match kind {
        DetailKind::Gp => Some(view.gp.as_str()),
        DetailKind::Block => None,
    };
    let feature = store.layer().find_location(&view.block, gp);
    let classification = feature.and_then(|f| store.classification().and_then(|c| c.get(&f.id)));

    let mut fields: Vec<&str> = store.filters().columns();
    if let Some(active) = view.active_variable.as_deref() {
        if !fields.contains(&active) {
            fields.push(active);
        }
    }
    let variables = store.catalog().variables(view.level);
    let metrics = fields
        .into_iter()
        .map(|field| {
            let value = feature.and_then(|f| f.numeric(field));
            MetricCard {
                field: field.to_string(),
                label: variables.label(field).to_string(),
                value,
                display: format_metric(value),
            }
        })
        .collect();

    let mini_map = store.mini_map().map(|handle| MiniMapView {
        handle: handle.clone(),
        bounds: feature.and_then(feature_bounds),
    });

    Some(DetailView {
        kind,
        title,
        subtitle,
        feasibility: classification.map(|c| c.feasibility_label),
        feasibility_score: classification.and_then(|c| c.feasibility_score),
        metrics,
        mini_map,
    })
}

fn feature_title(feature: &MapFeature) -> String {
    feature
        .gp
        .as_deref()
        .or(feature.block.as_deref())
        .map(str::to_string)
        .unwrap_or_else(|| feature.id.to_string())
}

/// Two decimals, or "N/A" when absent
pub fn format_metric(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => "N/A".to_string(),
    }
}
