//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers never mutate the pasture; they consume a [`DrawList`].
//! - Draw order is ground, then shadows (blended, no depth test), then cows.

mod draw;
mod renderer;

pub use draw::{DrawCall, DrawList, DrawPass, MeshKind};
pub use paturage_kernel::FrameView;
pub use renderer::{DebugTextRenderer, RenderError, Renderer};

pub fn crate_info() -> &'static str {
    "paturage-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
