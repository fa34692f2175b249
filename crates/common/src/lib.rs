//! Shared types for the pasture workspace.
//!
//! # Invariants
//! - Transforms are column-major and compose by right multiplication.

pub mod transform;

pub use transform::Transform;

/// One full turn in radians.
pub const TAU: f32 = std::f32::consts::TAU;
