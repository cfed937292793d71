use crate::AssetError;
use glam::Vec3;
use skymirror_common::CubemapFaces;
use std::path::Path;

/// Decoded 8-bit RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRgba8 {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageRgba8 {
    /// Image filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: rgba.repeat((width * height) as usize),
        }
    }

    /// Decode any format the `image` crate supports into RGBA8.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(AssetError::InvalidImage(format!(
                "image '{}' has zero dimensions",
                path.display()
            )));
        }
        tracing::debug!("decoded {} ({width}x{height})", path.display());
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// One face of a cubemap, in GPU layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    pub fn layer(self) -> u32 {
        self as u32
    }

    /// Sampling direction through face coordinates `u, v` in `[-1, 1]`,
    /// with `v` growing downwards the way image rows do.
    pub fn direction(self, u: f32, v: f32) -> Vec3 {
        match self {
            CubeFace::PosX => Vec3::new(1.0, -v, -u),
            CubeFace::NegX => Vec3::new(-1.0, -v, u),
            CubeFace::PosY => Vec3::new(u, 1.0, v),
            CubeFace::NegY => Vec3::new(u, -1.0, -v),
            CubeFace::PosZ => Vec3::new(u, -v, 1.0),
            CubeFace::NegZ => Vec3::new(-u, -v, -1.0),
        }
        .normalize()
    }
}

/// Six square faces of equal size, indexed by [`CubeFace::layer`].
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapImages {
    pub size: u32,
    pub faces: [ImageRgba8; 6],
}

impl CubemapImages {
    /// Check that the faces are square and share one size.
    pub fn from_faces(faces: [ImageRgba8; 6]) -> Result<Self, AssetError> {
        let size = faces[0].width;
        for (face, img) in CubeFace::ALL.iter().zip(&faces) {
            if img.width != img.height {
                return Err(AssetError::InvalidImage(format!(
                    "cubemap face {face:?} is {}x{}, faces must be square",
                    img.width, img.height
                )));
            }
            if img.width != size {
                return Err(AssetError::InvalidImage(format!(
                    "cubemap face {face:?} is {}px, expected {size}px",
                    img.width
                )));
            }
        }
        Ok(Self { size, faces })
    }

    /// Load the six configured face images relative to `root`.
    pub fn load(root: &Path, faces: &CubemapFaces) -> Result<Self, AssetError> {
        let [px, nx, py, ny, pz, nz] = faces.in_layer_order().map(|p| root.join(p));
        let cubemap = Self::from_faces([
            ImageRgba8::load(px)?,
            ImageRgba8::load(nx)?,
            ImageRgba8::load(py)?,
            ImageRgba8::load(ny)?,
            ImageRgba8::load(pz)?,
            ImageRgba8::load(nz)?,
        ])?;
        tracing::info!("loaded cubemap ({}px faces)", cubemap.size);
        Ok(cubemap)
    }

    /// Procedural sky: blue zenith fading to a pale horizon over a dark ground.
    pub fn gradient_sky(size: u32) -> Self {
        let zenith = Vec3::new(0.18, 0.36, 0.75);
        let horizon = Vec3::new(0.85, 0.88, 0.92);
        let ground = Vec3::new(0.22, 0.2, 0.18);

        let faces = CubeFace::ALL.map(|face| {
            let mut pixels = Vec::with_capacity((size * size * 4) as usize);
            for y in 0..size {
                for x in 0..size {
                    let u = 2.0 * (x as f32 + 0.5) / size as f32 - 1.0;
                    let v = 2.0 * (y as f32 + 0.5) / size as f32 - 1.0;
                    let up = face.direction(u, v).y;
                    let color = if up >= 0.0 {
                        horizon.lerp(zenith, up.powf(0.6))
                    } else {
                        horizon.lerp(ground, (-up).powf(0.4))
                    };
                    let rgb = (color * 255.0).round().clamp(Vec3::ZERO, Vec3::splat(255.0));
                    pixels.extend_from_slice(&[rgb.x as u8, rgb.y as u8, rgb.z as u8, 255]);
                }
            }
            ImageRgba8 {
                width: size,
                height: size,
                pixels,
            }
        });
        Self { size, faces }
    }

    pub fn face(&self, face: CubeFace) -> &ImageRgba8 {
        &self.faces[face.layer() as usize]
    }
}
