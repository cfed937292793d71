use glam::{Mat4, Quat, Vec3};
use skymirror_common::{CameraConfig, DemoConfig, PointLight};

/// A light at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    pub position: Vec3,
    pub color: Vec3,
}

/// Everything that moves, evaluated at one scene time.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneState {
    pub time: f32,
    pub camera_position: Vec3,
    pub camera_target: Vec3,
    /// Model transform of the reflective object.
    pub model: Mat4,
    /// Model transform of the mirror; its translation lies on the mirror plane.
    pub mirror_model: Mat4,
    pub lights: Vec<LightSample>,
}

/// Rotate `point` about the Y axis through `origin`.
pub fn rotate_about_y(point: Vec3, origin: Vec3, angle: f32) -> Vec3 {
    origin + Quat::from_rotation_y(angle) * (point - origin)
}

/// Rotate `point` about the Z axis through `origin`.
pub fn rotate_about_z(point: Vec3, origin: Vec3, angle: f32) -> Vec3 {
    origin + Quat::from_rotation_z(angle) * (point - origin)
}

/// Maps scene time to [`SceneState`].
///
/// Sampling is a pure function of time, so any frame can be reproduced
/// from its timestamp alone.
#[derive(Debug, Clone)]
pub struct SceneAnimator {
    camera: CameraConfig,
    lights: Vec<PointLight>,
    light_rate: f32,
    spin_rate: f32,
    mirror_height: f32,
}

impl SceneAnimator {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            camera: config.camera.clone(),
            lights: config.scene.lights.clone(),
            light_rate: config.scene.light_rate,
            spin_rate: config.scene.spin_rate,
            mirror_height: config.mirror.height,
        }
    }

    pub fn camera_position(&self, time: f32) -> Vec3 {
        rotate_about_y(
            self.camera.orbit_start,
            Vec3::ZERO,
            time * self.camera.orbit_rate,
        )
    }

    /// Each light's initial position rotated about Z by `time * light_rate`.
    pub fn light_positions(&self, time: f32) -> Vec<Vec3> {
        self.lights
            .iter()
            .map(|l| rotate_about_z(l.initial_position, Vec3::ZERO, time * self.light_rate))
            .collect()
    }

    pub fn model(&self, time: f32) -> Mat4 {
        Mat4::from_rotation_y(time * self.spin_rate)
    }

    pub fn mirror_model(&self, time: f32) -> Mat4 {
        Mat4::from_rotation_y(time * self.spin_rate)
            * Mat4::from_translation(Vec3::new(0.0, self.mirror_height, 0.0))
    }

    pub fn sample(&self, time: f32) -> SceneState {
        let lights = self
            .light_positions(time)
            .into_iter()
            .zip(&self.lights)
            .map(|(position, light)| LightSample {
                position,
                color: light.color,
            })
            .collect();

        SceneState {
            time,
            camera_position: self.camera_position(time),
            camera_target: self.camera.target,
            model: self.model(time),
            mirror_model: self.mirror_model(time),
            lights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn lights_rotate_about_z_by_time() {
        let animator = SceneAnimator::new(&DemoConfig::default());
        for &t in &[0.0_f32, 0.3, 1.0, 2.5, 7.0] {
            let positions = animator.light_positions(t);
            assert_eq!(positions.len(), 2);
            for (pos, light) in positions.iter().zip(skymirror_common::default_lights()) {
                let p = light.initial_position;
                let expected = Vec3::new(
                    p.x * t.cos() - p.y * t.sin(),
                    p.x * t.sin() + p.y * t.cos(),
                    p.z,
                );
                assert!(approx(*pos, expected), "t={t}: {pos} vs {expected}");
            }
        }
    }

    #[test]
    fn quarter_turn_moves_light_onto_y_axis() {
        let animator = SceneAnimator::new(&DemoConfig::default());
        let positions = animator.light_positions(std::f32::consts::FRAC_PI_2);
        assert!(approx(positions[0], Vec3::new(0.0, 5.0, 2.0)));
        assert!(approx(positions[1], Vec3::new(0.0, -5.0, 2.0)));
    }

    #[test]
    fn camera_orbits_at_constant_distance() {
        let animator = SceneAnimator::new(&DemoConfig::default());
        let start = animator.camera_position(0.0);
        assert!(approx(start, Vec3::new(45.0, 0.0, 3.4)));
        let later = animator.camera_position(40.0);
        assert!((later.length() - start.length()).abs() < 1e-3);
        assert!(later.y.abs() < 1e-6);
    }

    #[test]
    fn rotate_about_y_matches_right_handed_rotation() {
        let p = rotate_about_y(Vec3::X, Vec3::ZERO, std::f32::consts::FRAC_PI_2);
        assert!(approx(p, Vec3::NEG_Z));
    }

    #[test]
    fn mirror_translation_stays_on_plane_height() {
        let mut config = DemoConfig::default();
        config.mirror.height = -4.0;
        let animator = SceneAnimator::new(&config);
        for &t in &[0.0_f32, 1.0, 10.0] {
            let translation = animator.mirror_model(t).w_axis.truncate();
            assert!(approx(translation, Vec3::new(0.0, -4.0, 0.0)));
        }
    }

    #[test]
    fn sample_carries_light_colors() {
        let animator = SceneAnimator::new(&DemoConfig::default());
        let state = animator.sample(1.0);
        assert_eq!(state.lights.len(), 2);
        assert_eq!(state.lights[1].color, Vec3::new(0.6, 0.1, 0.2));
        assert_eq!(state.time, 1.0);
    }
}
