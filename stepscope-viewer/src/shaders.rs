//! WGSL shaders for step viewers

/// Shared shader source: one vertex stage, a lit fragment entry for surface
/// triangles and a flat entry for wireframe edges and axis lines.
pub const SCENE_SHADER: &str = r#"
struct SceneUniform {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    light_dir: vec3<f32>,
    ambient: f32,
}

@group(0) @binding(0)
var<uniform> scene: SceneUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
}

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) color: vec3<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let world = scene.model * vec4<f32>(in.position, 1.0);
    out.clip_position = scene.view_proj * world;
    out.world_normal = normalize((scene.model * vec4<f32>(in.normal, 0.0)).xyz);
    out.color = in.color;
    return out;
}

@fragment
fn fs_lit(in: VertexOutput) -> @location(0) vec4<f32> {
    let diffuse = max(dot(normalize(in.world_normal), normalize(scene.light_dir)), 0.0);
    let intensity = max(scene.ambient, diffuse);
    return vec4<f32>(in.color * intensity, 1.0);
}

@fragment
fn fs_flat(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, 1.0);
}
"#;
