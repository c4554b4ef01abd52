//! LeafMap Client - Scoring service adapters
//!
//! `HttpScoringClient` talks to the remote scoring service over HTTP.
//! `MemoryScoringService` scores in-process over GeoJSON layers loaded at
//! startup, for development and testing.

pub mod http;
pub mod memory;

pub use http::HttpScoringClient;
pub use memory::{score_collection, MemoryScoringService};
