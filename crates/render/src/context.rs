//! Per-frame render state.

use crate::device::ObjectUniforms;
use crate::reflection::{normal_matrix, surface_reflection_matrix};
use glam::{Mat3, Mat4, UVec2, Vec3};
use skymirror_common::{CameraConfig, DemoConfig, MAX_LIGHTS};
use skymirror_scene::SceneState;

/// Normal of the mirror quad in its local space. The quad lies in the local
/// XZ plane, so the reflection plane through the quad origin contains it.
pub const MIRROR_NORMAL: Vec3 = Vec3::Y;

/// Camera position plus the view matrix rendered from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub view: Mat4,
}

impl CameraState {
    pub fn look_at(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            view: Mat4::look_at_rh(position, target, Vec3::Y),
        }
    }

    /// The camera seen in a mirror: the view composed with `reflection`, and
    /// the position moved across the mirror plane.
    pub fn reflected(&self, reflection: Mat4) -> Self {
        Self {
            position: reflection.transform_point3(self.position),
            view: self.view * reflection,
        }
    }
}

/// Matrix products for one camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTransforms {
    pub view_projection: Mat4,
    pub model_view: Mat4,
    pub model_view_projection: Mat4,
    pub normal_matrix: Mat3,
    /// Inverse of projection times the rotation part of the view. Maps
    /// clip-space points on the far plane to world-space directions.
    pub skybox_view_projection_inverse: Mat4,
}

impl SceneTransforms {
    pub fn compute(projection: Mat4, view: Mat4, model: Mat4) -> Self {
        let view_projection = projection * view;
        let view_rotation = Mat4::from_mat3(Mat3::from_mat4(view));
        Self {
            view_projection,
            model_view: view * model,
            model_view_projection: view_projection * model,
            normal_matrix: normal_matrix(model),
            skybox_view_projection_inverse: (projection * view_rotation).inverse(),
        }
    }
}

/// Size of the offscreen reflection target for a framebuffer of `framebuffer`
/// pixels. Each axis is at least one pixel.
pub fn reflection_target_size(framebuffer: UVec2, factor: f32) -> UVec2 {
    let scaled = (framebuffer.as_vec2() * factor).floor().as_uvec2();
    scaled.max(UVec2::ONE)
}

/// Everything one frame renders from.
///
/// Owned by the host and updated once per frame; each pipeline stage takes
/// it by reference.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub projection: Mat4,
    pub camera: CameraState,
    pub model: Mat4,
    pub mirror_model: Mat4,
    pub light_positions: [Vec3; MAX_LIGHTS],
    pub light_colors: [Vec3; MAX_LIGHTS],
    pub light_count: usize,
    pub ambient_color: Vec3,
    pub distortion_strength: f32,
    screen_size: UVec2,
    reflection_size: UVec2,
    camera_config: CameraConfig,
}

impl RenderContext {
    /// Context for a framebuffer of `screen_size`. The reflection target
    /// size is fixed here and never follows later resizes.
    pub fn new(config: &DemoConfig, screen_size: UVec2) -> Self {
        let screen_size = screen_size.max(UVec2::ONE);
        let camera = CameraState::look_at(config.camera.orbit_start, config.camera.target);
        Self {
            projection: projection(&config.camera, screen_size),
            camera,
            model: Mat4::IDENTITY,
            mirror_model: Mat4::from_translation(Vec3::new(0.0, config.mirror.height, 0.0)),
            light_positions: [Vec3::ZERO; MAX_LIGHTS],
            light_colors: [Vec3::ZERO; MAX_LIGHTS],
            light_count: 0,
            ambient_color: config.scene.ambient_color,
            distortion_strength: config.mirror.distortion_strength,
            screen_size,
            reflection_size: reflection_target_size(screen_size, config.mirror.resolution_factor),
            camera_config: config.camera.clone(),
        }
    }

    pub fn screen_size(&self) -> UVec2 {
        self.screen_size
    }

    pub fn reflection_size(&self) -> UVec2 {
        self.reflection_size
    }

    /// Follow a framebuffer resize. Only the projection and the screen size
    /// used by the mirror lookup change.
    pub fn set_screen_size(&mut self, size: UVec2) {
        self.screen_size = size.max(UVec2::ONE);
        self.projection = projection(&self.camera_config, self.screen_size);
        tracing::debug!(
            "screen resized to {}x{}, reflection target stays {}x{}",
            self.screen_size.x,
            self.screen_size.y,
            self.reflection_size.x,
            self.reflection_size.y
        );
    }

    /// Pull this frame's transforms and lights from the animated scene.
    pub fn update(&mut self, state: &SceneState) {
        self.camera = CameraState::look_at(state.camera_position, state.camera_target);
        self.model = state.model;
        self.mirror_model = state.mirror_model;

        self.light_count = state.lights.len().min(MAX_LIGHTS);
        for (i, light) in state.lights.iter().take(MAX_LIGHTS).enumerate() {
            self.light_positions[i] = light.position;
            self.light_colors[i] = light.color;
        }
    }

    /// Reflection across the mirror plane for the current mirror transform.
    pub fn mirror_reflection(&self) -> Mat4 {
        surface_reflection_matrix(self.mirror_model, MIRROR_NORMAL)
    }

    pub fn object_uniforms(
        &self,
        camera: &CameraState,
        transforms: &SceneTransforms,
    ) -> ObjectUniforms {
        ObjectUniforms {
            model_view_projection: transforms.model_view_projection,
            model: self.model,
            normal_matrix: transforms.normal_matrix,
            camera_position: camera.position,
            ambient_color: self.ambient_color,
            light_positions: self.light_positions,
            light_colors: self.light_colors,
            light_count: self.light_count as u32,
        }
    }
}

fn projection(camera: &CameraConfig, size: UVec2) -> Mat4 {
    let aspect = camera.aspect_scale * size.x as f32 / size.y as f32;
    Mat4::perspective_rh(camera.fov_y, aspect, camera.near, camera.far)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::Plane;
    use skymirror_scene::SceneAnimator;

    #[test]
    fn reflection_target_is_a_fifth() {
        assert_eq!(
            reflection_target_size(UVec2::new(800, 600), 0.2),
            UVec2::new(160, 120)
        );
    }

    #[test]
    fn reflection_target_never_empty() {
        assert_eq!(reflection_target_size(UVec2::new(3, 2), 0.2), UVec2::ONE);
    }

    #[test]
    fn reflection_plane_contains_mirror_quad() {
        let config = DemoConfig::default();
        let animator = SceneAnimator::new(&config);
        let mut ctx = RenderContext::new(&config, UVec2::new(800, 600));
        let h = config.mirror.half_extent;
        let corners = [
            Vec3::new(-h, 0.0, h),
            Vec3::new(h, 0.0, h),
            Vec3::new(-h, 0.0, -h),
            Vec3::new(h, 0.0, -h),
        ];
        for time in [0.0, 1.3, 7.0] {
            ctx.update(&animator.sample(time));
            let plane = Plane::from_surface(ctx.mirror_model, MIRROR_NORMAL);
            let reflection = ctx.mirror_reflection();
            for corner in corners {
                let world = ctx.mirror_model.transform_point3(corner);
                assert!(plane.signed_distance(world).abs() < 1e-4, "{world} at t={time}");
                assert!(reflection.transform_point3(world).abs_diff_eq(world, 1e-3));
            }
        }
    }

    #[test]
    fn resize_keeps_reflection_size() {
        let mut ctx = RenderContext::new(&DemoConfig::default(), UVec2::new(800, 600));
        let before = ctx.projection;
        ctx.set_screen_size(UVec2::new(1920, 1080));
        assert_eq!(ctx.reflection_size(), UVec2::new(160, 120));
        assert_eq!(ctx.screen_size(), UVec2::new(1920, 1080));
        assert_ne!(ctx.projection, before);
    }

    #[test]
    fn reflected_camera_is_mirrored_below_plane() {
        let camera = CameraState::look_at(Vec3::new(10.0, 4.0, 0.0), Vec3::ZERO);
        let reflection =
            surface_reflection_matrix(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)), Vec3::Y);
        let mirrored = camera.reflected(reflection);
        assert!((mirrored.position - Vec3::new(10.0, -6.0, 0.0)).length() < 1e-4);
        // The mirrored view sees the world point reflected.
        let p = Vec3::new(1.0, 2.0, 3.0);
        let q = reflection.transform_point3(p);
        assert!(
            (mirrored.view.transform_point3(q) - camera.view.transform_point3(p)).length() < 1e-3
        );
    }

    #[test]
    fn skybox_inverse_ignores_camera_translation() {
        let projection = Mat4::perspective_rh(1.0, 1.5, 0.1, 100.0);
        let a = SceneTransforms::compute(
            projection,
            Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y),
            Mat4::IDENTITY,
        );
        let b = SceneTransforms::compute(
            projection,
            Mat4::look_at_rh(Vec3::new(30.0, 2.0, 5.0), Vec3::new(30.0, 2.0, 0.0), Vec3::Y),
            Mat4::IDENTITY,
        );
        assert!(
            a.skybox_view_projection_inverse
                .abs_diff_eq(b.skybox_view_projection_inverse, 1e-4)
        );
    }

    #[test]
    fn screen_center_looks_down_view_axis() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
        let t = SceneTransforms::compute(Mat4::perspective_rh(1.0, 1.0, 0.1, 100.0), view, Mat4::IDENTITY);
        let far = t.skybox_view_projection_inverse * glam::Vec4::new(0.0, 0.0, 1.0, 1.0);
        let dir = (far.truncate() / far.w).normalize();
        assert!((dir - Vec3::NEG_Z).length() < 1e-4);
    }

    #[test]
    fn update_copies_lights() {
        let config = DemoConfig::default();
        let mut ctx = RenderContext::new(&config, UVec2::new(800, 600));
        let state = SceneAnimator::new(&config).sample(0.0);
        ctx.update(&state);
        assert_eq!(ctx.light_count, 2);
        assert_eq!(ctx.light_positions[0], Vec3::new(5.0, 0.0, 2.0));
        assert_eq!(ctx.light_colors[1], Vec3::new(0.6, 0.1, 0.2));
        assert_eq!(ctx.light_positions[2], Vec3::ZERO);
    }
}
