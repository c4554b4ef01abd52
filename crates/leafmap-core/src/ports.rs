//! Port trait definitions
//!
//! These traits define the interfaces that adapters must implement.

pub mod scoring;

pub use scoring::{
    ExportRequest, FeasibilityRequest, GpBlockListing, GpSummary, Recommendation,
    RecommendationRequest, ScoringService,
};
