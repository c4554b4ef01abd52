//! Geometry helpers for viewport fitting

pub mod bounds;

pub use bounds::{feature_bounds, union_bounds, Bounds};
