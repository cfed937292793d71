//! std140-compatible uniform blocks matching the WGSL structs in `shaders`.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Vec3};
use skymirror_common::MAX_LIGHTS;
use skymirror_render::{MirrorUniforms, ObjectUniforms};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct SkyboxBlock {
    view_projection_inverse: [[f32; 4]; 4],
}

impl SkyboxBlock {
    pub fn new(view_projection_inverse: glam::Mat4) -> Self {
        Self {
            view_projection_inverse: view_projection_inverse.to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectBlock {
    model_view_projection: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    // mat3x3 columns are padded to vec4.
    normal_matrix: [[f32; 4]; 3],
    camera_position: [f32; 4],
    ambient_color: [f32; 4],
    light_positions: [[f32; 4]; MAX_LIGHTS],
    light_colors: [[f32; 4]; MAX_LIGHTS],
    light_count: u32,
    _pad: [u32; 3],
}

impl From<&ObjectUniforms> for ObjectBlock {
    fn from(u: &ObjectUniforms) -> Self {
        Self {
            model_view_projection: u.model_view_projection.to_cols_array_2d(),
            model: u.model.to_cols_array_2d(),
            normal_matrix: mat3_padded(u.normal_matrix),
            camera_position: vec4(u.camera_position),
            ambient_color: vec4(u.ambient_color),
            light_positions: u.light_positions.map(vec4),
            light_colors: u.light_colors.map(vec4),
            light_count: u.light_count.min(MAX_LIGHTS as u32),
            _pad: [0; 3],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct MirrorBlock {
    model_view_projection: [[f32; 4]; 4],
    screen_size: [f32; 2],
    distortion_strength: f32,
    _pad: f32,
}

impl From<&MirrorUniforms> for MirrorBlock {
    fn from(u: &MirrorUniforms) -> Self {
        Self {
            model_view_projection: u.model_view_projection.to_cols_array_2d(),
            screen_size: u.screen_size.to_array(),
            distortion_strength: u.distortion_strength,
            _pad: 0.0,
        }
    }
}

fn vec4(v: Vec3) -> [f32; 4] {
    v.extend(0.0).to_array()
}

fn mat3_padded(m: Mat3) -> [[f32; 4]; 3] {
    [vec4(m.x_axis), vec4(m.y_axis), vec4(m.z_axis)]
}
