//! wgpu render backend for the pasture.
//!
//! Draws the textured ground, one blended shadow per cow and the cows
//! themselves, in the order given by a [`paturage_render::DrawList`].
//!
//! # Invariants
//! - Renderer never mutates simulation state.
//! - Shader and pipeline validation errors surface as `RenderError::Shader`.

mod bindings;
mod gpu;
mod mesh;
mod shaders;
mod texture;

pub use bindings::{ResourceSlot, ShaderBindings};
pub use gpu::WgpuRenderer;
pub use mesh::{MeshData, SHADOW_SIZE, Vertex};
pub use texture::{fallback_image, load_image, texture_file_name};
