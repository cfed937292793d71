//! Asset loading: meshes as flat arrays, cubemap faces, mirror textures.
//!
//! Everything the renderer uploads at startup comes through [`SceneAssets`].
//! A failed load aborts startup; there is no retry or partial fallback
//! beyond the built-in meshes and procedural sky used when no file is
//! configured.

mod mesh;
mod texture;

use skymirror_common::DemoConfig;
use std::path::PathBuf;

pub use mesh::MeshData;
pub use texture::{CubeFace, CubemapImages, ImageRgba8};

/// Radius of the built-in sphere used when no object mesh is configured.
pub const DEFAULT_OBJECT_RADIUS: f32 = 5.0;

/// Edge length of the procedural sky faces.
pub const DEFAULT_SKY_SIZE: u32 = 256;

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decode image {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
}

/// Everything uploaded to the GPU before the first frame.
#[derive(Debug, Clone)]
pub struct SceneAssets {
    pub object: MeshData,
    pub mirror: MeshData,
    pub cubemap: CubemapImages,
    pub distortion: Option<ImageRgba8>,
}

impl SceneAssets {
    /// Load the assets named by `config`, substituting built-ins for the
    /// object mesh and sky when none are configured.
    pub fn load(config: &DemoConfig) -> Result<Self, AssetError> {
        let object = match &config.assets.object_mesh {
            Some(path) => MeshData::load_json(config.asset_path(path))?,
            None => {
                tracing::info!("no object mesh configured, using built-in sphere");
                MeshData::uv_sphere(DEFAULT_OBJECT_RADIUS, 48, 24)
            }
        }
        .with_computed_normals();

        let cubemap = match &config.skybox.faces {
            Some(faces) => CubemapImages::load(&config.assets.root, faces)?,
            None => {
                let size = config.skybox.procedural_size.unwrap_or(DEFAULT_SKY_SIZE);
                tracing::info!("no skybox faces configured, using {size}px procedural sky");
                CubemapImages::gradient_sky(size)
            }
        };

        let distortion = config
            .mirror
            .distortion_map
            .as_ref()
            .map(|path| ImageRgba8::load(config.asset_path(path)))
            .transpose()?;

        Ok(Self {
            object,
            mirror: MeshData::mirror_quad(config.mirror.half_extent),
            cubemap,
            distortion,
        })
    }

    /// Assets that need nothing from disk.
    pub fn builtin(config: &DemoConfig) -> Self {
        Self {
            object: MeshData::uv_sphere(DEFAULT_OBJECT_RADIUS, 48, 24),
            mirror: MeshData::mirror_quad(config.mirror.half_extent),
            cubemap: CubemapImages::gradient_sky(
                config.skybox.procedural_size.unwrap_or(DEFAULT_SKY_SIZE),
            ),
            distortion: None,
        }
    }
}

pub fn crate_info() -> &'static str {
    "skymirror-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;
    use skymirror_common::CubemapFaces;

    #[test]
    fn default_config_loads_builtins() {
        let mut config = DemoConfig::default();
        config.skybox.procedural_size = Some(8);
        let assets = SceneAssets::load(&config).unwrap();
        assert!(assets.object.has_normals());
        assert_eq!(assets.mirror.vertex_count(), 4);
        assert_eq!(assets.cubemap.size, 8);
        assert!(assets.distortion.is_none());
    }

    #[test]
    fn object_mesh_without_normals_gets_them() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tri.json"),
            r#"{"positions": [0,0,0, 1,0,0, 0,0,-1], "indices": [0,1,2]}"#,
        )
        .unwrap();

        let mut config = DemoConfig::default();
        config.assets.root = dir.path().to_path_buf();
        config.assets.object_mesh = Some("tri.json".into());
        config.skybox.procedural_size = Some(4);

        let assets = SceneAssets::load(&config).unwrap();
        assert_eq!(assets.object.normals.len(), 9);
    }

    #[test]
    fn missing_cubemap_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = DemoConfig::default();
        config.assets.root = dir.path().to_path_buf();
        config.skybox.faces = Some(CubemapFaces::default());
        assert!(matches!(
            SceneAssets::load(&config),
            Err(AssetError::Image { .. })
        ));
    }

    #[test]
    fn builtin_uses_mirror_extent() {
        let mut config = DemoConfig::default();
        config.mirror.half_extent = 3.0;
        config.skybox.procedural_size = Some(4);
        let assets = SceneAssets::builtin(&config);
        assert_eq!(assets.mirror.positions[0], -3.0);
    }
}
