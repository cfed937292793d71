use glam::UVec2;
use skymirror_assets::{CubeFace, CubemapImages, ImageRgba8};

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// 1x1 mid-grey map: a distortion lookup of 0.5 cancels to no offset.
pub fn neutral_distortion() -> ImageRgba8 {
    ImageRgba8::solid(1, 1, [128, 128, 128, 255])
}

fn extent(size: UVec2, layers: u32) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width: size.x.max(1),
        height: size.y.max(1),
        depth_or_array_layers: layers,
    }
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, image: &ImageRgba8) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: 0,
                y: 0,
                z: layer,
            },
            aspect: wgpu::TextureAspect::All,
        },
        &image.pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(4 * image.width),
            rows_per_image: Some(image.height),
        },
        extent(UVec2::new(image.width, image.height), 1),
    );
}

/// Upload six faces as a cube texture and return a cube view.
pub fn upload_cubemap(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    cubemap: &CubemapImages,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("environment_cubemap"),
        size: extent(UVec2::splat(cubemap.size), 6),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    for face in CubeFace::ALL {
        write_layer(queue, &texture, face.layer(), cubemap.face(face));
    }
    texture.create_view(&wgpu::TextureViewDescriptor {
        label: Some("environment_cubemap_view"),
        dimension: Some(wgpu::TextureViewDimension::Cube),
        ..Default::default()
    })
}

/// Upload a 2D image. Data maps are linear, so pick `Rgba8Unorm` for them.
pub fn upload_image(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    image: &ImageRgba8,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(UVec2::new(image.width, image.height), 1),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    write_layer(queue, &texture, 0, image);
    texture.create_view(&Default::default())
}

/// Color target that can be rendered into and sampled afterwards.
pub fn create_color_target(
    device: &wgpu::Device,
    label: &str,
    size: UVec2,
    format: wgpu::TextureFormat,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size, 1),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

pub fn create_depth_texture(device: &wgpu::Device, label: &str, size: UVec2) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: extent(size, 1),
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}

pub fn create_sampler(
    device: &wgpu::Device,
    label: &str,
    address_mode: wgpu::AddressMode,
) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_distortion_is_mid_grey() {
        let map = neutral_distortion();
        assert_eq!((map.width, map.height), (1, 1));
        let offset = map.pixel(0, 0)[0] as f32 / 255.0 - 0.5;
        assert!(offset.abs() < 0.01);
    }

    #[test]
    fn extents_never_zero() {
        let e = extent(UVec2::ZERO, 6);
        assert_eq!((e.width, e.height, e.depth_or_array_layers), (1, 1, 6));
    }
}
