//! Rendering core: planar reflection math and the two-pass mirror pipeline.
//!
//! # Invariants
//! - Reflection matrices are involutions with determinant -1.
//! - The cull face in effect before a reflection pass is in effect after it,
//!   whether the pass succeeds or fails.
//! - The mirror quad is only ever drawn to the screen target.
//!
//! Backends implement [`GraphicsDevice`]. [`CommandRecorder`] is the
//! in-memory one used by tests and the CLI trace.

mod context;
mod cull;
mod device;
mod driver;
mod error;
mod pipeline;
mod recorder;
mod reflection;

pub use context::{
    CameraState, MIRROR_NORMAL, RenderContext, SceneTransforms, reflection_target_size,
};
pub use cull::CullFaceGuard;
pub use device::{
    CullFace, DrawCall, DrawKind, GraphicsDevice, MirrorUniforms, ObjectUniforms, RasterState,
    RenderTarget,
};
pub use driver::FrameDriver;
pub use error::{RenderError, RenderResult};
pub use pipeline::{
    MirrorPass, draw_mirror, draw_scene, mirror_center_uv, render_frame, screen_uv,
};
pub use recorder::{Command, CommandRecorder};
pub use reflection::{Plane, normal_matrix, reflection_matrix, surface_reflection_matrix};

pub fn crate_info() -> &'static str {
    "skymirror-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
