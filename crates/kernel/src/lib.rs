//! Pasture kernel: cow physics, herd stepping, camera easing.
//!
//! # Invariants
//! - After every update each cow's horizontal position lies within the bounds.
//! - A cow whose height drops below zero (or becomes NaN) lands at height zero.
//! - Seeded pastures replay identically for the same sequence of frames.

pub mod config;
pub mod cow;
pub mod pasture;

pub use config::{Breed, CameraConfig, ConfigError, PastureConfig, PhysicsConfig};
pub use cow::{Cow, CowUpdate};
pub use pasture::{FrameView, Pasture, PastureEvent, PastureSummary};

pub fn crate_info() -> &'static str {
    "paturage-kernel v0.1.0"
}
