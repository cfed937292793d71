//! Scene animation: maps elapsed time to camera, light, and model transforms.
//!
//! # Invariants
//! - Scene state is a pure function of scene time.
//! - The mirror transform's translation always lies on the mirror plane.

mod animator;
mod clock;

pub use animator::{LightSample, SceneAnimator, SceneState, rotate_about_y, rotate_about_z};
pub use clock::AnimationClock;

pub fn crate_info() -> &'static str {
    "skymirror-scene v0.1.0"
}
