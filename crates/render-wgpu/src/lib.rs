//! wgpu render backend for the mirror scene.
//!
//! Draws a cubemap skybox, a Phong-lit environment-mapped object, and a
//! planar mirror whose image comes from an offscreen reflection pass.
//!
//! # Invariants
//! - The reflection target is created once and never resized.
//! - Offscreen and onscreen passes are encoded in recorded order into one
//!   command buffer per frame.

mod gpu;
mod mesh;
mod shaders;
mod textures;
mod uniforms;

pub use gpu::{WgpuFrame, WgpuRenderer};
pub use mesh::{MirrorVertex, ObjectVertex, mirror_vertices, object_vertices};
pub use textures::neutral_distortion;

/// Map wgpu setup failures into the renderer's error type.
pub mod setup {
    use skymirror_render::RenderError;

    pub fn surface_error(err: wgpu::CreateSurfaceError) -> RenderError {
        RenderError::CreateSurface(err.to_string())
    }

    pub fn device_error(err: wgpu::RequestDeviceError) -> RenderError {
        RenderError::RequestDevice(err.to_string())
    }

    /// Prefer an sRGB surface format, else whatever comes first.
    pub fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
        formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| formats.first())
            .copied()
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn prefers_srgb() {
            let formats = [
                wgpu::TextureFormat::Bgra8Unorm,
                wgpu::TextureFormat::Bgra8UnormSrgb,
            ];
            assert_eq!(
                pick_surface_format(&formats),
                Some(wgpu::TextureFormat::Bgra8UnormSrgb)
            );
        }

        #[test]
        fn falls_back_to_first() {
            assert_eq!(
                pick_surface_format(&[wgpu::TextureFormat::Rgba16Float]),
                Some(wgpu::TextureFormat::Rgba16Float)
            );
            assert_eq!(pick_surface_format(&[]), None);
        }
    }
}

pub fn crate_info() -> &'static str {
    "skymirror-render-wgpu v0.1.0"
}
