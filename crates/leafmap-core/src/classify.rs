//! Classification engine
//!
//! Feasibility classification reads the scoring service's answer; choropleth
//! classification bins a single variable locally over the visible features.

pub mod choropleth;
pub mod feasibility;

pub use choropleth::{ChoroplethScale, LegendEntry, BIN_COUNT, CHOROPLETH_RAMP};
pub use feasibility::{classify_response, FeasibilityResponse, WireStatistics};
