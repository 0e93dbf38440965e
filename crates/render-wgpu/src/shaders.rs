//! WGSL sources for the three overlay programs.
//!
//! All three share the per-draw `DrawUniforms` block at group 0, bound with
//! a dynamic offset. Group 1 differs per program.

/// Line program: grid, frusta, colliders. Group 1 is the four-entry palette.
pub const LINE_SHADER: &str = r#"
struct DrawUniforms {
    mvp: mat4x4<f32>,
    color_mode: u32,
    joint_base: u32,
    _pad: vec2<u32>,
};

struct Palette {
    colors: array<vec4<f32>, 4>,
};

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(1) @binding(0)
var<uniform> palette: Palette;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color_index: f32,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) @interpolate(flat) color_index: u32,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = draw.mvp * vec4<f32>(vertex.position, 1.0);
    out.color_index = select(u32(vertex.color_index + 0.5), draw.color_mode, draw.color_mode != 0u);
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(palette.colors[min(in.color_index, 3u)].rgb, 1.0);
}
"#;

/// Icon program: textured billboard quads. Group 1 is the icon texture.
pub const ICON_SHADER: &str = r#"
struct DrawUniforms {
    mvp: mat4x4<f32>,
    color_mode: u32,
    joint_base: u32,
    _pad: vec2<u32>,
};

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(1) @binding(0)
var icon_texture: texture_2d<f32>;
@group(1) @binding(1)
var icon_sampler: sampler;

struct IconVertex {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct IconOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_icon(vertex: IconVertex) -> IconOutput {
    var out: IconOutput;
    out.clip_position = draw.mvp * vec4<f32>(vertex.position, 1.0);
    // Image rows are stored top row first.
    out.uv = vec2<f32>(vertex.uv.x, 1.0 - vertex.uv.y);
    return out;
}

@fragment
fn fs_icon(in: IconOutput) -> @location(0) vec4<f32> {
    let color = textureSample(icon_texture, icon_sampler, in.uv);
    if color.a < 0.1 {
        discard;
    }
    return color;
}
"#;

/// Joint program: one model matrix per joint, fetched by vertex index from a
/// storage buffer starting at `joint_base`.
pub const JOINT_SHADER: &str = r#"
struct DrawUniforms {
    mvp: mat4x4<f32>,
    color_mode: u32,
    joint_base: u32,
    _pad: vec2<u32>,
};

@group(0) @binding(0)
var<uniform> draw: DrawUniforms;

@group(1) @binding(0)
var<storage, read> joint_models: array<mat4x4<f32>>;

@vertex
fn vs_joint(
    @builtin(vertex_index) joint: u32,
    @location(0) position: vec3<f32>,
) -> @builtin(position) vec4<f32> {
    let model = joint_models[draw.joint_base + joint];
    return draw.mvp * model * vec4<f32>(position, 1.0);
}

@fragment
fn fs_joint() -> @location(0) vec4<f32> {
    return vec4<f32>(1.0, 0.85, 0.2, 1.0);
}
"#;
