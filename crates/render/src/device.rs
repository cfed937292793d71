//! The graphics API as seen by the frame pipeline.
//!
//! Shader compilation and buffer upload happen when a backend is built;
//! per frame the pipeline only binds targets, toggles fixed-function state,
//! and issues draws.

use crate::error::RenderResult;
use glam::{Mat3, Mat4, UVec2, Vec2, Vec3};
use skymirror_common::MAX_LIGHTS;

/// Where clears and draws land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The window's framebuffer.
    Screen,
    /// Offscreen color + depth target holding the mirrored scene.
    Reflection,
}

/// Which triangle face is discarded when culling is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullFace {
    Front,
    #[default]
    Back,
}

impl CullFace {
    pub fn flipped(self) -> Self {
        match self {
            CullFace::Front => CullFace::Back,
            CullFace::Back => CullFace::Front,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    Skybox,
    Object,
    Mirror,
}

/// Per-draw inputs for the lit, environment-mapped object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectUniforms {
    pub model_view_projection: Mat4,
    pub model: Mat4,
    pub normal_matrix: Mat3,
    pub camera_position: Vec3,
    pub ambient_color: Vec3,
    pub light_positions: [Vec3; MAX_LIGHTS],
    pub light_colors: [Vec3; MAX_LIGHTS],
    pub light_count: u32,
}

/// Per-draw inputs for the mirror quad.
#[derive(Debug, Clone, PartialEq)]
pub struct MirrorUniforms {
    pub model_view_projection: Mat4,
    pub screen_size: Vec2,
    pub distortion_strength: f32,
}

/// One draw and its uniform values.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    /// Full-screen sky; directions come from the inverse view-projection.
    Skybox { view_projection_inverse: Mat4 },
    Object(ObjectUniforms),
    Mirror(MirrorUniforms),
}

impl DrawCall {
    pub fn kind(&self) -> DrawKind {
        match self {
            DrawCall::Skybox { .. } => DrawKind::Skybox,
            DrawCall::Object(_) => DrawKind::Object,
            DrawCall::Mirror(_) => DrawKind::Mirror,
        }
    }
}

/// Fixed-function state a draw is issued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterState {
    pub depth_test: bool,
    /// `None` when culling is disabled.
    pub cull: Option<CullFace>,
}

/// The graphics device collaborator.
///
/// State is sticky the way a GL context's is: a setting stays in effect
/// until changed. Binding a target also sets the viewport to cover it.
pub trait GraphicsDevice {
    /// Route later clears and draws to `target`.
    fn bind_target(&mut self, target: RenderTarget) -> RenderResult<()>;

    /// Pixel size of `target`.
    fn target_size(&self, target: RenderTarget) -> UVec2;

    /// Clear color and depth of the bound target.
    fn clear(&mut self) -> RenderResult<()>;

    fn set_depth_test(&mut self, enabled: bool);

    fn set_culling(&mut self, enabled: bool);

    fn cull_face(&self) -> CullFace;

    fn set_cull_face(&mut self, face: CullFace);

    /// Issue an indexed draw with the current state.
    fn draw(&mut self, call: &DrawCall) -> RenderResult<()>;
}
