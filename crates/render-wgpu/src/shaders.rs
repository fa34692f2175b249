/// WGSL shader for every pasture draw: textured, lit geometry, or a
/// darkened, alpha-faded shadow when `draw.shadow` is non-negative.
pub const PASTURE_SHADER: &str = r#"
struct FrameUniforms {
    view_proj: mat4x4<f32>,
};

struct DrawUniforms {
    model: mat4x4<f32>,
    rot: mat4x4<f32>,
    shadow: f32,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniforms;

@group(1) @binding(0)
var<uniform> draw: DrawUniforms;

@group(2) @binding(0)
var t_diffuse: texture_2d<f32>;

@group(2) @binding(1)
var s_diffuse: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) tex_coord: vec2<f32>,
    @location(2) normal: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coord: vec2<f32>,
    @location(1) normal: vec3<f32>,
};

@vertex
fn vs_main(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = frame.view_proj * draw.model * vec4<f32>(vertex.position, 1.0);
    out.tex_coord = vertex.tex_coord;
    out.normal = (draw.rot * vec4<f32>(vertex.normal, 0.0)).xyz;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let colour = textureSample(t_diffuse, s_diffuse, in.tex_coord);

    if (draw.shadow >= 0.0) {
        return vec4<f32>(0.0, 0.0, 0.0, colour.a * draw.shadow);
    }

    let light_dir = normalize(vec3<f32>(0.3, 1.0, 0.5));
    let ambient = 0.45;
    let diffuse = max(dot(normalize(in.normal), light_dir), 0.0);
    let lighting = ambient + diffuse * 0.55;
    return vec4<f32>(colour.rgb * lighting, 1.0);
}
"#;
