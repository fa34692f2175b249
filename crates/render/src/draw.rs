use paturage_common::Transform;
use paturage_kernel::{Breed, FrameView, Pasture};

/// Which mesh (and texture) a draw call uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Ground,
    Shadow,
    Cow(Breed),
}

/// Pipeline state a draw call needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawPass {
    /// Depth tested and written, no blending.
    Opaque,
    /// Alpha blended, depth test off.
    Blended,
}

/// One mesh draw with its per-draw uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCall {
    pub mesh: MeshKind,
    pub pass: DrawPass,
    pub model: Transform,
    /// Rotation-only transform for normals.
    pub rotation: Transform,
    /// Shadow darkness; `None` for lit geometry.
    pub shadow: Option<f32>,
}

/// Everything a backend needs to draw one frame, in submission order.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    pub view_projection: Transform,
    pub clear_color: [f32; 4],
    pub calls: Vec<DrawCall>,
}

impl DrawList {
    /// Build the frame: the ground, one shadow per cow, then the cows.
    pub fn build(pasture: &Pasture, view: &FrameView) -> Self {
        let physics = &pasture.config().physics;
        let cows = pasture.cows();
        let mut calls = Vec::with_capacity(1 + cows.len() * 2);

        calls.push(DrawCall {
            mesh: MeshKind::Ground,
            pass: DrawPass::Opaque,
            model: Transform::identity(),
            rotation: Transform::identity(),
            shadow: None,
        });

        calls.extend(cows.iter().map(|cow| DrawCall {
            mesh: MeshKind::Shadow,
            pass: DrawPass::Blended,
            model: cow.shadow_model(),
            rotation: *cow.rotation(),
            shadow: Some(cow.shadow_intensity(physics)),
        }));

        calls.extend(cows.iter().map(|cow| DrawCall {
            mesh: MeshKind::Cow(cow.breed),
            pass: DrawPass::Opaque,
            model: *cow.model(),
            rotation: *cow.rotation(),
            shadow: None,
        }));

        Self {
            view_projection: view.view_projection,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            calls,
        }
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Draw calls of a single pass, in order.
    pub fn in_pass(&self, pass: DrawPass) -> impl Iterator<Item = &DrawCall> {
        self.calls.iter().filter(move |c| c.pass == pass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paturage_kernel::PastureConfig;

    fn frame() -> (Pasture, DrawList) {
        let mut pasture = Pasture::with_seed(PastureConfig::default(), 21);
        pasture.frame(0.0, 1.0);
        let view = pasture.frame(0.016, 1.0);
        let list = DrawList::build(&pasture, &view);
        (pasture, list)
    }

    #[test]
    fn one_ground_and_two_calls_per_cow() {
        let (pasture, list) = frame();
        assert_eq!(list.len(), 1 + 2 * pasture.cows().len());
        assert_eq!(list.calls[0].mesh, MeshKind::Ground);
        assert_eq!(list.calls[0].model, Transform::identity());
    }

    #[test]
    fn shadows_come_before_cows() {
        let (pasture, list) = frame();
        let n = pasture.cows().len();
        assert!(list.calls[1..=n].iter().all(|c| c.mesh == MeshKind::Shadow));
        assert!(list.calls[n + 1..]
            .iter()
            .all(|c| matches!(c.mesh, MeshKind::Cow(_))));
    }

    #[test]
    fn only_shadows_are_blended() {
        let (_, list) = frame();
        assert!(list.in_pass(DrawPass::Blended).all(|c| c.shadow.is_some()));
        assert!(list.in_pass(DrawPass::Opaque).all(|c| c.shadow.is_none()));
    }

    #[test]
    fn cow_calls_carry_breed_and_model() {
        let (pasture, list) = frame();
        let n = pasture.cows().len();
        for (cow, call) in pasture.cows().iter().zip(&list.calls[n + 1..]) {
            assert_eq!(call.mesh, MeshKind::Cow(cow.breed));
            assert_eq!(call.model, *cow.model());
        }
    }

    #[test]
    fn view_projection_comes_from_frame() {
        let mut pasture = Pasture::with_seed(PastureConfig::default(), 22);
        let view = pasture.frame(3.0, 1.3);
        let list = DrawList::build(&pasture, &view);
        assert_eq!(list.view_projection, view.view_projection);
    }
}
