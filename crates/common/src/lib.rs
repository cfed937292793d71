//! Shared types for the skymirror demo.
//!
//! Configuration lives here so that asset loading, animation, and rendering
//! all read the same values.

mod config;
mod types;

pub use config::{
    AssetConfig, CameraConfig, ConfigError, CubemapFaces, DemoConfig, MirrorConfig, SceneConfig,
    SkyboxConfig,
};
pub use types::{MAX_LIGHTS, PointLight, default_lights};

pub fn crate_info() -> &'static str {
    "skymirror-common v0.1.0"
}
