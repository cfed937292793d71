use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Number of light slots the object shader is compiled for.
pub const MAX_LIGHTS: usize = 4;

/// A point light that orbits the origin over time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    /// Position at `t = 0`, in world space.
    pub initial_position: Vec3,
    /// Linear RGB color, multiplied into the diffuse term.
    pub color: Vec3,
}

impl PointLight {
    pub fn new(initial_position: Vec3, color: Vec3) -> Self {
        Self {
            initial_position,
            color,
        }
    }
}

/// The two lights the demo ships with: a white key light and a dim red fill.
pub fn default_lights() -> Vec<PointLight> {
    vec![
        PointLight::new(Vec3::new(5.0, 0.0, 2.0), Vec3::new(1.0, 1.0, 1.0)),
        PointLight::new(Vec3::new(-5.0, 0.0, 2.0), Vec3::new(0.6, 0.1, 0.2)),
    ]
}
