//! 软粒子着色器片段
//!
//! 数值片段与 `render::depth` 中的 CPU 函数一一对应。

use crate::core::error::RenderResult;
use crate::render::shader_builder::{ShaderChunk, ShaderProgram, ShaderProgramBuilder};

pub const UNIFORMS: &str = r#"
struct SoftParticleUniforms {
    view: mat4x4<f32>,
    projection: mat4x4<f32>,
    model: mat4x4<f32>,
    diffuse: vec4<f32>,
    screen_size: vec2<f32>,
    camera_near: f32,
    camera_far: f32,
    size: f32,
    scale: f32,
    opacity: f32,
    fade_margin: f32,
    fade_steepness: f32,
    flags: u32,
};

const FLAG_SIZE_ATTENUATION: u32 = 1u;
const FLAG_DEPTH_AVAILABLE: u32 = 2u;
const FLAG_PERSPECTIVE: u32 = 4u;
const FLAG_USE_MAP: u32 = 8u;

@group(0) @binding(0) var<uniform> params: SoftParticleUniforms;
@group(0) @binding(1) var sprite_texture: texture_2d<f32>;
@group(0) @binding(2) var sprite_sampler: sampler;
@group(0) @binding(3) var scene_depth: texture_depth_2d;

fn has_flag(flag: u32) -> bool {
    return (params.flags & flag) != 0u;
}
"#;

pub const VERTEX_TRANSFORM: &str = r#"
fn view_position(local: vec3<f32>) -> vec4<f32> {
    return params.view * params.model * vec4<f32>(local, 1.0);
}
"#;

pub const PARTICLE_SIZE: &str = r#"
fn point_size(view_z: f32) -> f32 {
    if (!(has_flag(FLAG_PERSPECTIVE) && has_flag(FLAG_SIZE_ATTENUATION))) {
        return params.size;
    }
    if (view_z >= 0.0) {
        return 0.0;
    }
    return params.size * (params.scale / -view_z);
}
"#;

pub const DEPTH_SAMPLING: &str = r#"
fn perspective_depth_to_view_z(depth: f32, near: f32, far: f32) -> f32 {
    return (near * far) / ((far - near) * depth - far);
}

fn view_z_to_orthographic_depth(view_z: f32, near: f32, far: f32) -> f32 {
    return (view_z + near) / (near - far);
}

fn linear_depth(depth: f32) -> f32 {
    if (!has_flag(FLAG_PERSPECTIVE)) {
        return depth;
    }
    let view_z = perspective_depth_to_view_z(depth, params.camera_near, params.camera_far);
    return view_z_to_orthographic_depth(view_z, params.camera_near, params.camera_far);
}

fn solid_depth_at(frag_xy: vec2<f32>) -> f32 {
    let uv = frag_xy / params.screen_size;
    let dims = vec2<i32>(textureDimensions(scene_depth));
    let texel = clamp(vec2<i32>(uv * vec2<f32>(dims)), vec2<i32>(0, 0), dims - vec2<i32>(1, 1));
    return textureLoad(scene_depth, texel, 0);
}
"#;

pub const FADE: &str = r#"
fn ease_in_out_quad(a: f32) -> f32 {
    if (a < 0.5) {
        return 2.0 * a * a;
    }
    return 1.0 - 2.0 * (a - 1.0) * (a - 1.0);
}

fn fade_edge(particle_depth: f32, solid_depth: f32) -> f32 {
    let a = (solid_depth + params.fade_margin - particle_depth) * params.fade_steepness;
    if (a != a) {
        return 1.0;
    }
    if (a <= 0.0) {
        return 0.0;
    }
    if (a >= 1.0) {
        return 1.0;
    }
    return ease_in_out_quad(a);
}
"#;

pub const ENTRY_POINTS: &str = r#"
struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[vertex_index];

    let mv_position = view_position(position);
    let clip = params.projection * mv_position;
    let size_px = point_size(mv_position.z);
    let offset = corner * 2.0 * size_px / params.screen_size * clip.w;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.z, clip.w);
    out.uv = vec2<f32>(corner.x + 0.5, 0.5 - corner.y);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let texel = textureSample(sprite_texture, sprite_sampler, in.uv);

    var tint = in.color;
    if (all(tint == vec3<f32>(0.0, 0.0, 0.0))) {
        tint = params.diffuse.rgb;
    }
    var color = vec4<f32>(tint, params.opacity);
    if (has_flag(FLAG_USE_MAP)) {
        color = color * texel;
    }

    var alpha_scale = 1.0;
    if (has_flag(FLAG_DEPTH_AVAILABLE)) {
        let particle_depth = linear_depth(in.clip_position.z);
        let solid_depth = linear_depth(solid_depth_at(in.clip_position.xy));
        alpha_scale = fade_edge(particle_depth, solid_depth);
    }
    return vec4<f32>(color.rgb, color.a * alpha_scale);
}
"#;

/// 组合软粒子程序所需的片段名
pub const REQUIRED_CHUNKS: [&str; 6] = [
    "uniforms",
    "vertex_transform",
    "particle_size",
    "depth_sampling",
    "fade",
    "entry_points",
];

/// 组合软粒子着色器程序
pub fn soft_particle_program() -> RenderResult<ShaderProgram> {
    ShaderProgramBuilder::new("Soft Particle Shader")
        .chunk(ShaderChunk::new("uniforms", UNIFORMS))
        .chunk(ShaderChunk::new("vertex_transform", VERTEX_TRANSFORM))
        .chunk(ShaderChunk::new("particle_size", PARTICLE_SIZE))
        .chunk(ShaderChunk::new("depth_sampling", DEPTH_SAMPLING))
        .chunk(ShaderChunk::new("fade", FADE))
        .chunk(ShaderChunk::new("entry_points", ENTRY_POINTS))
        .require(&REQUIRED_CHUNKS)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::particles::material::{
        FLAG_DEPTH_AVAILABLE, FLAG_PERSPECTIVE, FLAG_SIZE_ATTENUATION, FLAG_USE_MAP,
    };

    #[test]
    fn test_program_composes() {
        let program = soft_particle_program().unwrap();
        assert_eq!(program.chunk_names, REQUIRED_CHUNKS.to_vec());
        assert!(program.source.contains("fn vs_main"));
        assert!(program.source.contains("fn fs_main"));
    }

    #[test]
    fn test_flag_constants_match_rust() {
        for (name, value) in [
            ("FLAG_SIZE_ATTENUATION", FLAG_SIZE_ATTENUATION),
            ("FLAG_DEPTH_AVAILABLE", FLAG_DEPTH_AVAILABLE),
            ("FLAG_PERSPECTIVE", FLAG_PERSPECTIVE),
            ("FLAG_USE_MAP", FLAG_USE_MAP),
        ] {
            let decl = format!("const {name}: u32 = {value}u;");
            assert!(UNIFORMS.contains(&decl), "missing {decl}");
        }
    }

    #[test]
    fn test_fade_constants_not_hardcoded() {
        // 余量和陡度来自 uniform，而不是写死在着色器里
        assert!(FADE.contains("params.fade_margin"));
        assert!(FADE.contains("params.fade_steepness"));
    }

    #[test]
    fn test_fragment_samples_before_branching() {
        let sample = ENTRY_POINTS.find("textureSample(").unwrap();
        let first_branch = ENTRY_POINTS.find("fn fs_main").map(|start| {
            ENTRY_POINTS[start..].find("if (").map(|i| start + i).unwrap()
        });
        assert!(sample < first_branch.unwrap());
    }
}
