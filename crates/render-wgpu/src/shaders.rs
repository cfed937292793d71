/// Full-screen sky. Each pixel's far-plane point is unprojected with the
/// rotation-only inverse view-projection and used as the cubemap direction.
pub const SKYBOX_SHADER: &str = r#"
struct SkyboxUniforms {
    view_projection_inverse: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> sky: SkyboxUniforms;
@group(0) @binding(1)
var sky_texture: texture_cube<f32>;
@group(0) @binding(2)
var sky_sampler: sampler;

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) ndc: vec4<f32>,
};

@vertex
fn vs_skybox(@builtin(vertex_index) index: u32) -> SkyOutput {
    let corner = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    let ndc = vec4<f32>(corner * 2.0 - 1.0, 1.0, 1.0);

    var out: SkyOutput;
    out.clip_position = ndc;
    out.ndc = ndc;
    return out;
}

@fragment
fn fs_skybox(in: SkyOutput) -> @location(0) vec4<f32> {
    let t = sky.view_projection_inverse * in.ndc;
    let direction = normalize(t.xyz / t.w);
    return textureSample(sky_texture, sky_sampler, direction);
}
"#;

/// Phong-lit object with an environment reflection added on top.
pub const OBJECT_SHADER: &str = r#"
const MAX_LIGHTS: u32 = 4u;

struct ObjectUniforms {
    model_view_projection: mat4x4<f32>,
    model: mat4x4<f32>,
    normal_matrix: mat3x3<f32>,
    camera_position: vec4<f32>,
    ambient_color: vec4<f32>,
    light_positions: array<vec4<f32>, 4>,
    light_colors: array<vec4<f32>, 4>,
    light_count: u32,
};

@group(0) @binding(0)
var<uniform> object: ObjectUniforms;
@group(0) @binding(1)
var env_texture: texture_cube<f32>;
@group(0) @binding(2)
var env_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
};

@vertex
fn vs_object(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = object.model_view_projection * vec4<f32>(vertex.position, 1.0);
    out.world_position = (object.model * vec4<f32>(vertex.position, 1.0)).xyz;
    out.world_normal = object.normal_matrix * vertex.normal;
    return out;
}

@fragment
fn fs_object(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.world_normal);
    let eye = object.camera_position.xyz;
    let v = normalize(eye - in.world_position);

    var color = object.ambient_color.rgb;
    let count = min(object.light_count, MAX_LIGHTS);
    for (var i = 0u; i < count; i = i + 1u) {
        let l = normalize(object.light_positions[i].xyz - in.world_position);
        let diffuse = max(dot(l, n), -0.1);
        let specular = pow(max(dot(v, reflect(-l, n)), 0.0), 30.0);
        color = color + object.light_colors[i].rgb * diffuse + vec3<f32>(specular);
    }

    let reflected = reflect(in.world_position - eye, n);
    let env = textureSample(env_texture, env_sampler, reflected).rgb;
    return vec4<f32>(color + env, 1.0);
}
"#;

/// Mirror quad. Samples the offscreen reflection at the fragment's own
/// screen position, optionally offset by a distortion map.
pub const MIRROR_SHADER: &str = r#"
struct MirrorUniforms {
    model_view_projection: mat4x4<f32>,
    screen_size: vec2<f32>,
    distortion_strength: f32,
};

@group(0) @binding(0)
var<uniform> mirror: MirrorUniforms;
@group(0) @binding(1)
var reflection_texture: texture_2d<f32>;
@group(0) @binding(2)
var reflection_sampler: sampler;
@group(0) @binding(3)
var distortion_texture: texture_2d<f32>;
@group(0) @binding(4)
var distortion_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_mirror(vertex: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = mirror.model_view_projection * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_mirror(in: VertexOutput) -> @location(0) vec4<f32> {
    let offset = textureSample(distortion_texture, distortion_sampler, in.uv).r - 0.5;
    let uv = in.clip_position.xy / mirror.screen_size + vec2<f32>(offset * mirror.distortion_strength);
    return textureSample(reflection_texture, reflection_sampler, uv);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use skymirror_common::MAX_LIGHTS;

    #[test]
    fn light_array_matches_max_lights() {
        assert!(OBJECT_SHADER.contains(&format!("array<vec4<f32>, {MAX_LIGHTS}>")));
        assert!(OBJECT_SHADER.contains(&format!("MAX_LIGHTS: u32 = {MAX_LIGHTS}u")));
    }

    #[test]
    fn entry_points_present() {
        for (source, entries) in [
            (SKYBOX_SHADER, ["fn vs_skybox", "fn fs_skybox"]),
            (OBJECT_SHADER, ["fn vs_object", "fn fs_object"]),
            (MIRROR_SHADER, ["fn vs_mirror", "fn fs_mirror"]),
        ] {
            for entry in entries {
                assert!(source.contains(entry), "missing {entry}");
            }
        }
    }
}
