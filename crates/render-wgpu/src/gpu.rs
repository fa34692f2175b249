use crate::bindings::ShaderBindings;
use crate::mesh::{MeshData, Vertex};
use crate::shaders;
use crate::texture;
use bytemuck::{Pod, Zeroable};
use paturage_kernel::Breed;
use paturage_render::{DrawList, DrawPass, MeshKind, RenderError};
use std::collections::HashMap;
use std::path::Path;
use wgpu::util::DeviceExt;

/// Shadow factor written for lit geometry.
const NO_SHADOW: f32 = -1.0;

/// Remaps OpenGL clip depth [-1, 1] to the [0, 1] range wgpu expects.
#[rustfmt::skip]
const OPENGL_TO_WGPU: glam::Mat4 = glam::Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

/// Draw blocks allocated up front; the buffer grows when a frame needs more.
const INITIAL_DRAW_CAPACITY: usize = 64;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct FrameUniforms {
    view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    model: [[f32; 4]; 4],
    rot: [[f32; 4]; 4],
    shadow: f32,
    _pad: [f32; 3],
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_vertex_buffer")),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}_index_buffer")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertex_buffer,
            index_buffer,
            index_count: data.indices.len() as u32,
        }
    }
}

/// wgpu-based pasture renderer.
pub struct WgpuRenderer {
    opaque_pipeline: wgpu::RenderPipeline,
    blended_pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    draw_layout: wgpu::BindGroupLayout,
    draw_buffer: wgpu::Buffer,
    draw_bind_group: wgpu::BindGroup,
    draw_capacity: usize,
    draw_stride: u64,
    ground: GpuMesh,
    shadow: GpuMesh,
    cow: GpuMesh,
    textures: HashMap<MeshKind, wgpu::BindGroup>,
    depth_texture: wgpu::TextureView,
}

impl WgpuRenderer {
    /// Build pipelines, meshes and textures.
    ///
    /// Textures are read from `texture_dir` when given; anything missing is
    /// generated. Shader or pipeline validation failures are returned as
    /// [`RenderError::Shader`].
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        texture_dir: Option<&Path>,
    ) -> Result<Self, RenderError> {
        let bindings = ShaderBindings::default();
        tracing::debug!(bindings = ?bindings.named(), "shader bindings");

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: bindings.frame_uniform.binding,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let draw_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("draw_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: bindings.draw_uniform.binding,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<DrawUniforms>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: bindings.texture.binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: bindings.sampler.binding,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // Layout order is the group index: frame, draw, texture.
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&frame_layout, &draw_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pasture_shader"),
            source: wgpu::ShaderSource::Wgsl(shaders::PASTURE_SHADER.into()),
        });

        let opaque_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            &bindings,
            DrawPass::Opaque,
        );
        let blended_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            surface_format,
            &bindings,
            DrawPass::Blended,
        );

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            tracing::error!("shader validation failed: {error}");
            return Err(RenderError::Shader(error.to_string()));
        }

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame_uniform_buffer"),
            contents: bytemuck::bytes_of(&FrameUniforms {
                view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame_bind_group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: bindings.frame_uniform.binding,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let alignment = u64::from(device.limits().min_uniform_buffer_offset_alignment);
        let draw_size = std::mem::size_of::<DrawUniforms>() as u64;
        let draw_stride = draw_size.div_ceil(alignment) * alignment;

        let (draw_buffer, draw_bind_group) = create_draw_buffer(
            device,
            &draw_layout,
            &bindings,
            INITIAL_DRAW_CAPACITY,
            draw_stride,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("texture_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let kinds = [MeshKind::Ground, MeshKind::Shadow]
            .into_iter()
            .chain(Breed::ALL.into_iter().map(MeshKind::Cow));
        let mut textures = HashMap::new();
        for kind in kinds {
            let image = texture::load_image(texture_dir, kind);
            let view = upload_texture(device, queue, &image, &texture::texture_file_name(kind));
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("texture_bind_group"),
                layout: &texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: bindings.texture.binding,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: bindings.sampler.binding,
                        resource: wgpu::BindingResource::Sampler(&sampler),
                    },
                ],
            });
            textures.insert(kind, bind_group);
        }

        let depth_texture = Self::create_depth_texture(device, width, height);

        tracing::info!(textures = textures.len(), draw_stride, "pasture renderer ready");

        Ok(Self {
            opaque_pipeline,
            blended_pipeline,
            frame_buffer,
            frame_bind_group,
            draw_layout,
            draw_buffer,
            draw_bind_group,
            draw_capacity: INITIAL_DRAW_CAPACITY,
            draw_stride,
            ground: GpuMesh::upload(device, &MeshData::ground(), "ground"),
            shadow: GpuMesh::upload(device, &MeshData::shadow(), "shadow"),
            cow: GpuMesh::upload(device, &MeshData::cow(), "cow"),
            textures,
            depth_texture,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = Self::create_depth_texture(device, width, height);
    }

    /// Render one frame from a draw list, in list order.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        target: &wgpu::TextureView,
        frame: &DrawList,
    ) {
        queue.write_buffer(
            &self.frame_buffer,
            0,
            bytemuck::bytes_of(&FrameUniforms {
                view_proj: (OPENGL_TO_WGPU * frame.view_projection.to_mat4())
                    .to_cols_array_2d(),
            }),
        );

        self.ensure_draw_capacity(device, frame.len());

        let stride = self.draw_stride as usize;
        let draw_size = std::mem::size_of::<DrawUniforms>();
        let mut staging = vec![0u8; frame.len() * stride];
        for (i, call) in frame.calls.iter().enumerate() {
            let uniforms = DrawUniforms {
                model: call.model.to_cols_array_2d(),
                rot: call.rotation.to_cols_array_2d(),
                shadow: call.shadow.unwrap_or(NO_SHADOW),
                _pad: [0.0; 3],
            };
            let offset = i * stride;
            staging[offset..offset + draw_size].copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        if !staging.is_empty() {
            queue.write_buffer(&self.draw_buffer, 0, &staging);
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let [r, g, b, a] = frame.clear_color.map(f64::from);
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            let mut current_pass = None;
            for (i, call) in frame.calls.iter().enumerate() {
                let Some(texture) = self.textures.get(&call.mesh) else {
                    continue;
                };

                if current_pass != Some(call.pass) {
                    pass.set_pipeline(match call.pass {
                        DrawPass::Opaque => &self.opaque_pipeline,
                        DrawPass::Blended => &self.blended_pipeline,
                    });
                    current_pass = Some(call.pass);
                }

                let mesh = match call.mesh {
                    MeshKind::Ground => &self.ground,
                    MeshKind::Shadow => &self.shadow,
                    MeshKind::Cow(_) => &self.cow,
                };

                pass.set_bind_group(1, &self.draw_bind_group, &[(i * stride) as u32]);
                pass.set_bind_group(2, texture, &[]);
                pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }

    fn ensure_draw_capacity(&mut self, device: &wgpu::Device, draws: usize) {
        if draws <= self.draw_capacity {
            return;
        }
        let capacity = draws.next_power_of_two();
        let bindings = ShaderBindings::default();
        let (buffer, bind_group) =
            create_draw_buffer(device, &self.draw_layout, &bindings, capacity, self.draw_stride);
        self.draw_buffer = buffer;
        self.draw_bind_group = bind_group;
        self.draw_capacity = capacity;
        tracing::debug!(capacity, "grew draw uniform buffer");
    }

    fn create_depth_texture(
        device: &wgpu::Device,
        width: u32,
        height: u32,
    ) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("depth_texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&Default::default())
    }
}

/// Opaque draws test and write depth; blended shadows skip the depth test and
/// are composited over the ground.
fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    bindings: &ShaderBindings,
    pass: DrawPass,
) -> wgpu::RenderPipeline {
    let attributes = bindings.vertex_attributes();
    let (label, blend, depth_write_enabled, depth_compare) = match pass {
        DrawPass::Opaque => (
            "opaque_pipeline",
            wgpu::BlendState::REPLACE,
            true,
            wgpu::CompareFunction::Less,
        ),
        DrawPass::Blended => (
            "blended_pipeline",
            wgpu::BlendState::ALPHA_BLENDING,
            false,
            wgpu::CompareFunction::Always,
        ),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &attributes,
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled,
            depth_compare,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

fn create_draw_buffer(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    bindings: &ShaderBindings,
    capacity: usize,
    stride: u64,
) -> (wgpu::Buffer, wgpu::BindGroup) {
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("draw_uniform_buffer"),
        size: capacity as u64 * stride,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("draw_bind_group"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: bindings.draw_uniform.binding,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer: &buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<DrawUniforms>() as u64),
            }),
        }],
    });
    (buffer, bind_group)
}

fn upload_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    image: &image::RgbaImage,
    label: &str,
) -> wgpu::TextureView {
    let (width, height) = image.dimensions();
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        size,
    );
    texture.create_view(&Default::default())
}
