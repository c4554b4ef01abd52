pub mod classification;
pub mod feature;
pub mod filter;
pub mod location;
pub mod variable;
pub mod view;

pub use classification::{
    ClassificationResult, Distribution, DistributionBucket, FeasibilityLabel,
    FeasibilityStatistics, FeatureClassification, NO_DATA_COLOR,
};
pub use feature::{FeatureId, FeatureLayer, LayerSchema, MapFeature};
pub use filter::{Filter, FilterLogic, FilterSet, Preference};
pub use location::{
    BlockNode, BlockRow, DistrictNode, GpLocation, GpNode, LevelInfo, LevelsInfo, LocationHierarchy, LocationListing,
    LocationNode,
};
pub use variable::{InterventionConfig, InterventionVariable, VariableCatalog, VariableDescriptor};
pub use view::{Level, Panel, ViewState};
