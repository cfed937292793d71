//! Demo configuration, loaded from YAML.
//!
//! Every section has defaults, so a config file only needs the fields it
//! overrides. Validation runs after parsing and rejects values the renderer
//! cannot honor.

use crate::types::{MAX_LIGHTS, PointLight, default_lights};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading or validating a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level demo configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub camera: CameraConfig,
    pub scene: SceneConfig,
    pub mirror: MirrorConfig,
    pub skybox: SkyboxConfig,
    pub assets: AssetConfig,
}

/// Orbiting camera and projection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position at `t = 0`; it orbits the Y axis from here.
    pub orbit_start: Vec3,
    /// Orbit speed in radians per second of scene time.
    pub orbit_rate: f32,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    /// Multiplier applied to the framebuffer aspect ratio.
    pub aspect_scale: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            orbit_start: Vec3::new(45.0, 0.0, 3.4),
            orbit_rate: 0.05,
            target: Vec3::new(0.0, -0.5, 0.0),
            fov_y: std::f32::consts::PI / 2.5,
            aspect_scale: 2.0,
            near: 15.0,
            far: 100.0,
        }
    }
}

/// Lights, shading constants, and animation rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub lights: Vec<PointLight>,
    /// Light orbit speed about the Z axis, radians per second.
    pub light_rate: f32,
    pub ambient_color: Vec3,
    /// Spin of the object and the mirror about Y, radians per second.
    pub spin_rate: f32,
    /// Scene seconds per wall-clock second.
    pub time_scale: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            lights: default_lights(),
            light_rate: 1.0,
            ambient_color: Vec3::splat(0.05),
            spin_rate: 0.2354,
            time_scale: 1.0,
        }
    }
}

/// The planar mirror under the object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// World-space height of the mirror. The visible quad and the reflection
    /// plane both sit at this height since they share one model transform.
    pub height: f32,
    /// Half the side length of the mirror quad.
    pub half_extent: f32,
    /// Reflection target size as a fraction of the initial framebuffer.
    pub resolution_factor: f32,
    /// Optional grayscale image that wobbles the reflection lookup.
    pub distortion_map: Option<PathBuf>,
    /// Horizontal screen-space offset per unit of distortion.
    pub distortion_strength: f32,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            height: -6.0,
            half_extent: 20.0,
            resolution_factor: 0.2,
            distortion_map: None,
            distortion_strength: 0.0,
        }
    }
}

/// File names of the six cubemap faces, relative to the asset root.
///
/// The assignment is explicit so it can be checked against how the images
/// were actually exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubemapFaces {
    pub pos_x: PathBuf,
    pub neg_x: PathBuf,
    pub pos_y: PathBuf,
    pub neg_y: PathBuf,
    pub pos_z: PathBuf,
    pub neg_z: PathBuf,
}

impl Default for CubemapFaces {
    fn default() -> Self {
        Self {
            pos_x: "images/px.png".into(),
            neg_x: "images/nx.png".into(),
            pos_y: "images/py.png".into(),
            neg_y: "images/ny.png".into(),
            pos_z: "images/pz.png".into(),
            neg_z: "images/nz.png".into(),
        }
    }
}

impl CubemapFaces {
    /// Face paths in GPU layer order: +X, -X, +Y, -Y, +Z, -Z.
    pub fn in_layer_order(&self) -> [&Path; 6] {
        [
            &self.pos_x,
            &self.neg_x,
            &self.pos_y,
            &self.neg_y,
            &self.pos_z,
            &self.neg_z,
        ]
    }
}

/// Skybox source. Without face images a procedural gradient sky is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyboxConfig {
    pub faces: Option<CubemapFaces>,
    /// Edge length of the procedural sky faces.
    pub procedural_size: Option<u32>,
}

/// Where assets are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    /// JSON mesh for the reflective object; a sphere is used when absent.
    pub object_mesh: Option<PathBuf>,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            object_mesh: None,
        }
    }
}

impl DemoConfig {
    /// Load a config from a YAML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml(&data)?;
        tracing::debug!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Resolve a path relative to the asset root.
    pub fn asset_path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.assets.root.join(relative)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let lights = self.scene.lights.len();
        if lights == 0 {
            return Err(ConfigError::Invalid("at least one light is required".into()));
        }
        if lights > MAX_LIGHTS {
            return Err(ConfigError::Invalid(format!(
                "{lights} lights configured, the shader supports at most {MAX_LIGHTS}"
            )));
        }

        let factor = self.mirror.resolution_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "mirror.resolution_factor must be in (0, 1], got {factor}"
            )));
        }
        if self.mirror.half_extent <= 0.0 {
            return Err(ConfigError::Invalid(
                "mirror.half_extent must be positive".into(),
            ));
        }

        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(ConfigError::Invalid(format!(
                "camera planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if cam.aspect_scale <= 0.0 {
            return Err(ConfigError::Invalid(
                "camera.aspect_scale must be positive".into(),
            ));
        }
        if self.skybox.procedural_size == Some(0) {
            return Err(ConfigError::Invalid(
                "skybox.procedural_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        DemoConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = DemoConfig::from_yaml("mirror:\n  height: -3.5\n").unwrap();
        assert_eq!(config.mirror.height, -3.5);
        assert_eq!(config.mirror.resolution_factor, 0.2);
        assert_eq!(config.scene.lights.len(), 2);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn yaml_round_trip() {
        let mut config = DemoConfig::default();
        config.skybox.faces = Some(CubemapFaces::default());
        config.assets.object_mesh = Some("helmet.json".into());
        let yaml = config.to_yaml().unwrap();
        let parsed = DemoConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn rejects_zero_resolution_factor() {
        let err = DemoConfig::from_yaml("mirror:\n  resolution_factor: 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_too_many_lights() {
        let mut config = DemoConfig::default();
        config.scene.lights = vec![PointLight::new(Vec3::X, Vec3::ONE); MAX_LIGHTS + 1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_no_lights() {
        let mut config = DemoConfig::default();
        config.scene.lights.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let mut config = DemoConfig::default();
        config.camera.near = 200.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn faces_in_layer_order() {
        let faces = CubemapFaces::default();
        let order = faces.in_layer_order();
        assert_eq!(order[0], Path::new("images/px.png"));
        assert_eq!(order[1], Path::new("images/nx.png"));
        assert_eq!(order[5], Path::new("images/nz.png"));
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "scene:\n  time_scale: 0.5").unwrap();
        let config = DemoConfig::load(tmp.path()).unwrap();
        assert_eq!(config.scene.time_scale, 0.5);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DemoConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn demo_config_parses() {
        let config =
            DemoConfig::from_yaml(include_str!("../../../demos/skymirror.yaml")).unwrap();
        assert_eq!(config.skybox.faces, Some(CubemapFaces::default()));
        assert_eq!(config.scene.lights, DemoConfig::default().scene.lights);
        assert!((config.camera.fov_y - std::f32::consts::PI / 2.5).abs() < 1e-6);
    }

    #[test]
    fn asset_path_joins_root() {
        let config = DemoConfig::default();
        assert_eq!(config.asset_path("a.png"), PathBuf::from("assets/a.png"));
    }
}
