/// A `@group(g) @binding(b)` slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSlot {
    pub group: u32,
    pub binding: u32,
}

/// Locations of every shader input, fixed once at startup.
///
/// The pipelines, bind group layouts and WGSL source all agree on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderBindings {
    pub pos_attr: u32,
    pub tex_coord_attr: u32,
    pub normal_attr: u32,
    /// View-projection matrix, written once per frame.
    pub frame_uniform: ResourceSlot,
    /// Model matrix, rotation matrix and shadow factor, one block per draw.
    pub draw_uniform: ResourceSlot,
    pub texture: ResourceSlot,
    pub sampler: ResourceSlot,
}

impl Default for ShaderBindings {
    fn default() -> Self {
        Self {
            pos_attr: 0,
            tex_coord_attr: 1,
            normal_attr: 2,
            frame_uniform: ResourceSlot { group: 0, binding: 0 },
            draw_uniform: ResourceSlot { group: 1, binding: 0 },
            texture: ResourceSlot { group: 2, binding: 0 },
            sampler: ResourceSlot { group: 2, binding: 1 },
        }
    }
}

impl ShaderBindings {
    /// Vertex attributes for the interleaved position / tex coord / normal layout.
    pub fn vertex_attributes(&self) -> [wgpu::VertexAttribute; 3] {
        let float = std::mem::size_of::<f32>() as u64;
        [
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: 0,
                shader_location: self.pos_attr,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x2,
                offset: float * 3,
                shader_location: self.tex_coord_attr,
            },
            wgpu::VertexAttribute {
                format: wgpu::VertexFormat::Float32x3,
                offset: float * 5,
                shader_location: self.normal_attr,
            },
        ]
    }

    /// Named view of the bindings, for logging.
    pub fn named(&self) -> Vec<(&'static str, String)> {
        let slot = |s: ResourceSlot| format!("group {} binding {}", s.group, s.binding);
        vec![
            ("a_pos", format!("location {}", self.pos_attr)),
            ("a_tex_coord", format!("location {}", self.tex_coord_attr)),
            ("a_normal", format!("location {}", self.normal_attr)),
            ("u_frame", slot(self.frame_uniform)),
            ("u_draw", slot(self.draw_uniform)),
            ("u_texture", slot(self.texture)),
            ("u_sampler", slot(self.sampler)),
        ]
    }
}
