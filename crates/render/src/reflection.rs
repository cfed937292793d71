//! Planar reflection math.

use glam::{Mat3, Mat4, Vec3, Vec4};

/// Below this length a transformed normal is treated as degenerate.
const DEGENERATE_NORMAL: f32 = 1e-6;

/// Oriented plane `{p : dot(normal, p) + d = 0}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub d: f32,
}

impl Plane {
    /// Plane with the given normal and offset. The normal is used as given.
    pub fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Plane through `point` with `normal`, normalized.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            d: -normal.dot(point),
        }
    }

    /// Plane of a surface with world transform `model` whose normal in local
    /// space is `local_normal`. The plane passes through the surface origin.
    ///
    /// A transform that collapses the normal gives an undefined plane; no
    /// fallback is attempted.
    pub fn from_surface(model: Mat4, local_normal: Vec3) -> Self {
        let world_normal = normal_matrix(model) * local_normal;
        if world_normal.length() < DEGENERATE_NORMAL {
            tracing::warn!(
                "surface normal {local_normal} collapses to {world_normal} under the model transform"
            );
        }
        let point = model.w_axis.truncate();
        Self::from_point_normal(point, world_normal)
    }

    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// Inverse-transpose of the upper 3x3 of `model`.
pub fn normal_matrix(model: Mat4) -> Mat3 {
    Mat3::from_mat4(model).inverse().transpose()
}

/// Affine matrix reflecting all of space across `plane`.
///
/// | 1-2nx²   -2nxny   -2nxnz   -2nxd |
/// | -2nxny   1-2ny²   -2nynz   -2nyd |
/// | -2nxnz   -2nynz   1-2nz²   -2nzd |
/// |    0        0        0       1   |
pub fn reflection_matrix(plane: &Plane) -> Mat4 {
    let n = plane.normal;
    let d = plane.d;
    Mat4::from_cols(
        Vec4::new(1.0 - 2.0 * n.x * n.x, -2.0 * n.y * n.x, -2.0 * n.z * n.x, 0.0),
        Vec4::new(-2.0 * n.x * n.y, 1.0 - 2.0 * n.y * n.y, -2.0 * n.z * n.y, 0.0),
        Vec4::new(-2.0 * n.x * n.z, -2.0 * n.y * n.z, 1.0 - 2.0 * n.z * n.z, 0.0),
        Vec4::new(-2.0 * d * n.x, -2.0 * d * n.y, -2.0 * d * n.z, 1.0),
    )
}

/// Reflection across the plane of a surface, see [`Plane::from_surface`].
pub fn surface_reflection_matrix(model: Mat4, local_normal: Vec3) -> Mat4 {
    reflection_matrix(&Plane::from_surface(model, local_normal))
}
