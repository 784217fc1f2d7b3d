//! WGSL sources for drawing video textures and building their mip chains.

use wgpu::*;

// Quad uniform buffer structure (must match QuadUniform in quad.rs)
// Layout: rect[4] (x1, y1, x2, y2 in NDC), tint[4]

/// Vertex shader for a textured quad spanning an arbitrary rectangle.
/// Four vertices as a triangle strip; `(x1, y1)` samples the top of the
/// texture (v = 1) because video textures are stored bottom row first.
pub const VERTEX_SHADER: &str = r#"
    struct QuadUniform {
        rect: vec4<f32>,
        tint: vec4<f32>,
    };

    @group(0) @binding(2) var<uniform> quad: QuadUniform;

    struct VertexOutput {
        @location(0) tex_coords: vec2<f32>,
        @builtin(position) clip_position: vec4<f32>,
    };

    @vertex
    fn vs_main(@builtin(vertex_index) in_vertex_index: u32) -> VertexOutput {
        var corners = array<vec2<f32>, 4>(
            vec2<f32>(0.0, 0.0),
            vec2<f32>(1.0, 0.0),
            vec2<f32>(0.0, 1.0),
            vec2<f32>(1.0, 1.0),
        );
        let corner = corners[in_vertex_index];

        var out: VertexOutput;
        let x = mix(quad.rect.x, quad.rect.z, corner.x);
        let y = mix(quad.rect.y, quad.rect.w, corner.y);
        out.clip_position = vec4<f32>(x, y, 0.0, 1.0);
        out.tex_coords = vec2<f32>(corner.x, 1.0 - corner.y);
        return out;
    }
"#;

/// Fragment shader: texture sample times the tint, whose alpha is the
/// per-draw opacity.
pub const FRAGMENT_SHADER: &str = r#"
    struct QuadUniform {
        rect: vec4<f32>,
        tint: vec4<f32>,
    };

    @group(0) @binding(0) var t_texture: texture_2d<f32>;
    @group(0) @binding(1) var s_sampler: sampler;
    @group(0) @binding(2) var<uniform> quad: QuadUniform;

    struct VertexOutput {
        @location(0) tex_coords: vec2<f32>,
        @builtin(position) clip_position: vec4<f32>,
    };

    @fragment
    fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
        return textureSample(t_texture, s_sampler, in.tex_coords) * quad.tint;
    }
"#;

/// Fullscreen-triangle blit from one mip level into the next
pub const BLIT_SHADER: &str = r#"
    struct VertexOutput {
        @location(0) tex_coords: vec2<f32>,
        @builtin(position) clip_position: vec4<f32>,
    };

    @vertex
    fn vs_main(@builtin(vertex_index) in_vertex_index: u32) -> VertexOutput {
        var out: VertexOutput;
        let uv = vec2<f32>(f32((in_vertex_index << 1u) & 2u), f32(in_vertex_index & 2u));
        out.clip_position = vec4<f32>(uv * vec2<f32>(2.0, -2.0) + vec2<f32>(-1.0, 1.0), 0.0, 1.0);
        out.tex_coords = uv;
        return out;
    }

    @group(0) @binding(0) var t_source: texture_2d<f32>;
    @group(0) @binding(1) var s_source: sampler;

    @fragment
    fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
        return textureSample(t_source, s_source, in.tex_coords);
    }
"#;

/// Compile a shader module from WGSL source
pub fn compile_shader(device: &Device, label: &str, source: &str) -> ShaderModule {
    device.create_shader_module(ShaderModuleDescriptor {
        label: Some(label),
        source: ShaderSource::Wgsl(source.into()),
    })
}
