use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Half side length of the shadow quad, in cow-local units.
pub const SHADOW_SIZE: f32 = 2.0;

/// Half side length of the ground mesh.
const GROUND_SIZE: f32 = 3.0;

/// Interleaved vertex: 8 floats, 32 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
    pub normal: [f32; 3],
}

/// CPU-side mesh, ready to upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// Flat quad on the y = 0 plane facing up, `half` units from the centre.
    fn ground_quad(half: f32, uv_repeat: f32) -> Self {
        let n = [0.0, 1.0, 0.0];
        #[rustfmt::skip]
        let vertices = vec![
            Vertex { position: [-half, 0.0, -half], tex_coord: [0.0,        0.0       ], normal: n },
            Vertex { position: [ half, 0.0, -half], tex_coord: [uv_repeat,  0.0       ], normal: n },
            Vertex { position: [ half, 0.0,  half], tex_coord: [uv_repeat,  uv_repeat ], normal: n },
            Vertex { position: [-half, 0.0,  half], tex_coord: [0.0,        uv_repeat ], normal: n },
        ];
        Self {
            vertices,
            indices: vec![0, 2, 1, 2, 0, 3],
        }
    }

    /// The pasture floor.
    pub fn ground() -> Self {
        Self::ground_quad(GROUND_SIZE, 4.0)
    }

    /// Quad the shadow texture is drawn on, under a cow.
    pub fn shadow() -> Self {
        Self::ground_quad(SHADOW_SIZE, 1.0)
    }

    /// A blocky cow standing on y = 0 and facing +z.
    pub fn cow() -> Self {
        let mut mesh = Self::default();
        // body
        mesh.push_box(Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.45, 0.4, 0.85));
        // head
        mesh.push_box(Vec3::new(0.0, 1.35, 1.05), Vec3::new(0.28, 0.28, 0.3));
        // legs
        for (x, z) in [(-0.28, -0.6), (0.28, -0.6), (-0.28, 0.6), (0.28, 0.6)] {
            mesh.push_box(Vec3::new(x, 0.3, z), Vec3::new(0.1, 0.3, 0.1));
        }
        mesh
    }

    /// Append an axis-aligned box with per-face normals and unit UVs.
    fn push_box(&mut self, centre: Vec3, half: Vec3) {
        // (normal, u axis, v axis) per face; u x v = normal keeps the winding
        // counter-clockwise seen from outside.
        let faces = [
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        ];

        for (normal, u, v) in faces {
            let base = self.vertices.len() as u16;
            let face_centre = centre + normal * half;
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];

            for (cu, cv) in corners {
                let p = face_centre + u * half * cu + v * half * cv;
                self.vertices.push(Vertex {
                    position: p.to_array(),
                    tex_coord: [(cu + 1.0) / 2.0, (1.0 - cv) / 2.0],
                    normal: normal.to_array(),
                });
            }
            self.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_indices(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()));
    }

    fn triangle_normal(mesh: &MeshData, tri: &[u16]) -> Vec3 {
        let p = |i: u16| Vec3::from(mesh.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn vertex_is_eight_floats() {
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn shadow_quad_extent() {
        let mesh = MeshData::shadow();
        check_indices(&mesh);
        assert_eq!(mesh.vertices.len(), 4);
        for v in &mesh.vertices {
            assert_eq!(v.position[0].abs(), SHADOW_SIZE);
            assert_eq!(v.position[1], 0.0);
            assert_eq!(v.position[2].abs(), SHADOW_SIZE);
        }
    }

    #[test]
    fn ground_faces_up() {
        let mesh = MeshData::ground();
        check_indices(&mesh);
        for tri in mesh.indices.chunks(3) {
            assert!(triangle_normal(&mesh, tri).y > 0.0);
        }
    }

    #[test]
    fn cow_stands_on_ground() {
        let mesh = MeshData::cow();
        check_indices(&mesh);
        assert_eq!(mesh.vertices.len(), 6 * 6 * 4);
        let min_y = mesh
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::INFINITY, f32::min);
        assert!(min_y.abs() < 1e-6);
    }

    #[test]
    fn box_winding_matches_normals() {
        let mesh = MeshData::cow();
        for tri in mesh.indices.chunks(3) {
            let geometric = triangle_normal(&mesh, tri);
            let stored = Vec3::from(mesh.vertices[tri[0] as usize].normal);
            assert!(geometric.dot(stored) > 0.0);
        }
    }

    #[test]
    fn head_faces_forward() {
        let mesh = MeshData::cow();
        let max_z = mesh
            .vertices
            .iter()
            .map(|v| v.position[2])
            .fold(f32::NEG_INFINITY, f32::max);
        assert!(max_z > 1.0);
    }
}
