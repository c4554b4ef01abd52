//! LeafMap Core - Location state machine and map classification engine
//!
//! This crate contains the domain models, the filter set, the classification
//! algorithms, the view state reducer and the port definitions used by the
//! dashboard session.

pub mod classify;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod ports;
pub mod presenter;
pub mod session;
pub mod state;
pub mod url;

pub use error::{ErrorSeverity, LeafError, Result};
pub use session::Session;
pub use state::{Catalog, DashboardStore};
