//! View state machine
//!
//! `DashboardStore` owns the session state. User intents arrive as `Action`s,
//! completions of remote work as `Event`s; both are reduced synchronously and
//! return the `Effect`s the session runtime must carry out.

pub mod action;
pub mod catalog;
pub mod effect;
pub mod store;

pub use action::{Action, Event};
pub use catalog::Catalog;
pub use effect::{ChartHandle, DetailKind, Effect, MiniMapHandle, RenderCommand};
pub use store::DashboardStore;
