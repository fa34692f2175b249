use std::fmt::Write;

use crate::draw::{DrawList, DrawPass, MeshKind};

/// Errors a rendering backend can raise. All of them are fatal to the
/// renderer that produced them; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no compatible graphics adapter found")]
    NoAdapter,
    #[error("failed to create graphics device: {0}")]
    Device(String),
    #[error("shader error: {0}")]
    Shader(String),
    #[error("surface error: {0}")]
    Surface(String),
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer consumes a prepared [`DrawList`]; it never sees or mutates the
/// pasture itself.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame.
    fn render(&mut self, frame: &DrawList) -> Result<Self::Output, RenderError>;
}

/// Debug text renderer.
///
/// Produces a human-readable dump of a frame's draw calls. Used by the CLI
/// and for testing the render interface without a GPU.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, frame: &DrawList) -> Result<String, RenderError> {
        let mut out = String::new();
        let opaque = frame.in_pass(DrawPass::Opaque).count();
        let blended = frame.in_pass(DrawPass::Blended).count();

        // Writing to a String cannot fail.
        let _ = writeln!(
            out,
            "=== Frame {} ({} draws: {opaque} opaque, {blended} blended) ===",
            self.frames,
            frame.len()
        );

        for call in &frame.calls {
            let p = call.model.transform_point(glam::Vec3::ZERO);
            let mesh = match call.mesh {
                MeshKind::Ground => "ground".to_string(),
                MeshKind::Shadow => "shadow".to_string(),
                MeshKind::Cow(breed) => breed.name().to_string(),
            };
            let _ = write!(out, "  {mesh:<16} at=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z);
            if let Some(shadow) = call.shadow {
                let _ = write!(out, " shadow={shadow:.2}");
            }
            out.push('\n');
        }

        self.frames += 1;
        tracing::trace!(frame = self.frames, draws = frame.len(), "debug frame rendered");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paturage_kernel::{Pasture, PastureConfig};
    use std::collections::BTreeMap;

    #[test]
    fn debug_renderer_empty_herd() {
        let config = PastureConfig {
            herd: BTreeMap::new(),
            ..PastureConfig::default()
        };
        let mut pasture = Pasture::with_seed(config, 0);
        let view = pasture.frame(0.0, 1.0);
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&DrawList::build(&pasture, &view)).unwrap();

        assert!(output.contains("Frame 0"));
        assert!(output.contains("1 draws"));
        assert!(output.contains("ground"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn debug_renderer_lists_cows_and_shadows() {
        let mut pasture = Pasture::with_seed(PastureConfig::default(), 1);
        let view = pasture.frame(0.0, 1.0);
        let mut renderer = DebugTextRenderer::new();
        let output = renderer.render(&DrawList::build(&pasture, &view)).unwrap();

        assert!(output.contains("Holstein"));
        assert!(output.contains("Blanc Bleu Belge"));
        assert!(output.contains("shadow="));
        assert!(output.contains("17 blended"));
    }

    #[test]
    fn render_error_messages() {
        assert_eq!(
            RenderError::NoAdapter.to_string(),
            "no compatible graphics adapter found"
        );
        assert!(RenderError::Shader("bad".into()).to_string().contains("bad"));
    }
}
