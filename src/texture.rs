use std::path::Path;

use glam::Vec2;

use crate::error::InitError;
use crate::gpu::GpuContext;

/// Smallest power of two that is at least `dim` (and at least 1).
pub fn padded_dimension(dim: u32) -> u32 {
    dim.next_power_of_two()
}

/// An RGBA8 image copied into the top-left corner of a power-of-two canvas.
///
/// The padding is fully transparent. [`uv_extent`](Self::uv_extent) gives the
/// texture-coordinate range that covers only the source pixels.
#[derive(Clone, Debug)]
pub struct PaddedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub padded_width: u32,
    pub padded_height: u32,
}

impl PaddedImage {
    /// Pad tightly packed RGBA8 rows of `width * height` pixels.
    ///
    /// # Panics
    ///
    /// Panics if `rgba` is not exactly `width * height * 4` bytes.
    pub fn new(rgba: &[u8], width: u32, height: u32) -> Self {
        assert_eq!(
            rgba.len(),
            width as usize * height as usize * 4,
            "RGBA buffer does not match {width}x{height}"
        );

        let padded_width = padded_dimension(width);
        let padded_height = padded_dimension(height);
        let src_row = width as usize * 4;
        let dst_row = padded_width as usize * 4;

        let mut pixels = vec![0u8; dst_row * padded_height as usize];
        if src_row > 0 {
            for (src, dst) in rgba.chunks_exact(src_row).zip(pixels.chunks_exact_mut(dst_row)) {
                dst[..src_row].copy_from_slice(src);
            }
        }

        Self {
            pixels,
            width,
            height,
            padded_width,
            padded_height,
        }
    }

    pub fn from_rgba_image(img: &image::RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.as_raw(), width, height)
    }

    /// Reject a padded canvas wider or taller than `max_dimension`.
    ///
    /// `label` names the image in the error.
    pub fn ensure_fits(&self, max_dimension: u32, label: &str) -> Result<(), InitError> {
        if self.padded_width > max_dimension || self.padded_height > max_dimension {
            return Err(InitError::TextureTooLarge {
                path: label.into(),
                width: self.padded_width,
                height: self.padded_height,
                max: max_dimension,
            });
        }
        Ok(())
    }

    /// Fraction of the padded texture occupied by the source image.
    pub fn uv_extent(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 / self.padded_width as f32,
            self.height as f32 / self.padded_height as f32,
        )
    }
}

/// Decode an image file into RGBA8.
pub fn decode_file(path: impl AsRef<Path>) -> Result<image::RgbaImage, InitError> {
    let path = path.as_ref();
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|source| InitError::Image {
            path: path.to_path_buf(),
            source,
        })
}

/// Decode an in-memory encoded image into RGBA8. `label` names it in errors.
pub fn decode_bytes(bytes: &[u8], label: &str) -> Result<image::RgbaImage, InitError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| InitError::Image {
            path: label.into(),
            source,
        })
}

/// A GPU texture that can be bound to shaders.
#[derive(Debug)]
pub struct Texture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
    pub(crate) sampler: wgpu::Sampler,
    pub width: u32,
    pub height: u32,
    /// UV range covering the source pixels; `(1, 1)` when no padding was needed.
    pub uv_extent: Vec2,
}

impl Texture {
    /// Upload a padded image. The stored texture has the padded dimensions.
    ///
    /// Fails with [`InitError::TextureTooLarge`] when the padded size exceeds
    /// the device's 2D texture limit.
    pub fn from_padded(
        gpu: &GpuContext,
        image: &PaddedImage,
        label: &str,
    ) -> Result<Self, InitError> {
        use wgpu::util::DeviceExt;

        image.ensure_fits(gpu.device.limits().max_texture_dimension_2d, label)?;

        let texture = gpu.device.create_texture_with_data(
            &gpu.queue,
            &wgpu::TextureDescriptor {
                label: Some(label),
                size: wgpu::Extent3d {
                    width: image.padded_width,
                    height: image.padded_height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &image.pixels,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        // Nearest filtering, clamped so the padding never bleeds in at the edges.
        let sampler = gpu.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} Sampler", label)),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        log::info!(
            "texture '{}': {}x{} padded to {}x{}",
            label,
            image.width,
            image.height,
            image.padded_width,
            image.padded_height
        );

        Ok(Self {
            texture,
            view,
            sampler,
            width: image.padded_width,
            height: image.padded_height,
            uv_extent: image.uv_extent(),
        })
    }

    /// Load, pad and upload an image file.
    pub fn from_file(gpu: &GpuContext, path: impl AsRef<Path>) -> Result<Self, InitError> {
        let path = path.as_ref();
        let img = decode_file(path)?;
        let label = path.display().to_string();
        Self::from_padded(gpu, &PaddedImage::from_rgba_image(&img), &label)
    }

    /// Load, pad and upload an image from embedded bytes.
    pub fn from_bytes(gpu: &GpuContext, bytes: &[u8], label: &str) -> Result<Self, InitError> {
        let img = decode_bytes(bytes, label)?;
        Self::from_padded(gpu, &PaddedImage::from_rgba_image(&img), label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| [(i % 251) as u8, 10, 20, 255])
            .collect()
    }

    #[test]
    fn power_of_two_rule() {
        assert_eq!(padded_dimension(0), 1);
        assert_eq!(padded_dimension(1), 1);
        assert_eq!(padded_dimension(2), 2);
        assert_eq!(padded_dimension(3), 4);
        assert_eq!(padded_dimension(60), 64);
        assert_eq!(padded_dimension(64), 64);
        assert_eq!(padded_dimension(65), 128);
    }

    #[test]
    fn sixty_square_pads_to_sixty_four() {
        let src = solid(60, 60);
        let padded = PaddedImage::new(&src, 60, 60);

        assert_eq!((padded.padded_width, padded.padded_height), (64, 64));
        assert_eq!(padded.pixels.len(), 64 * 64 * 4);
        assert_eq!(padded.uv_extent(), Vec2::splat(0.9375));

        // Rows land at the padded stride, untouched pixels stay transparent.
        for y in 0..64usize {
            for x in 0..64usize {
                let dst = &padded.pixels[(y * 64 + x) * 4..][..4];
                if x < 60 && y < 60 {
                    assert_eq!(dst, &src[(y * 60 + x) * 4..][..4]);
                } else {
                    assert_eq!(dst, &[0, 0, 0, 0]);
                }
            }
        }
    }

    #[test]
    fn anisotropic_padding() {
        let padded = PaddedImage::new(&solid(5, 17), 5, 17);
        assert_eq!((padded.padded_width, padded.padded_height), (8, 32));
        let extent = padded.uv_extent();
        assert!((extent.x - 5.0 / 8.0).abs() < 1e-7);
        assert!((extent.y - 17.0 / 32.0).abs() < 1e-7);
    }

    #[test]
    fn power_of_two_input_is_unchanged() {
        let src = solid(16, 8);
        let padded = PaddedImage::new(&src, 16, 8);
        assert_eq!(padded.pixels, src);
        assert_eq!(padded.uv_extent(), Vec2::ONE);
    }

    #[test]
    fn padded_size_is_checked_against_device_limit() {
        // wgpu's default max_texture_dimension_2d.
        let limit = 8192;

        let wide = PaddedImage::new(&solid(8193, 1), 8193, 1);
        assert_eq!(wide.padded_width, 16384);
        let err = wide.ensure_fits(limit, "huge.png").unwrap_err();
        assert!(matches!(
            err,
            InitError::TextureTooLarge { width: 16384, height: 1, max: 8192, .. }
        ));
        assert!(err.to_string().contains("huge.png"));

        let tall = PaddedImage::new(&solid(1, 8193), 1, 8193);
        assert!(tall.ensure_fits(limit, "tall.png").is_err());

        let edge = PaddedImage::new(&solid(8192, 1), 8192, 1);
        assert!(edge.ensure_fits(limit, "edge.png").is_ok());
        assert!(PaddedImage::new(&solid(60, 60), 60, 60).ensure_fits(limit, "emblem").is_ok());
    }

    #[test]
    fn embedded_emblem_decodes() {
        let img = decode_bytes(include_bytes!("../assets/emblem60.png"), "emblem").unwrap();
        assert_eq!(img.dimensions(), (60, 60));
        let padded = PaddedImage::from_rgba_image(&img);
        assert_eq!((padded.padded_width, padded.padded_height), (64, 64));
    }

    #[test]
    fn bad_bytes_are_an_image_error() {
        let err = decode_bytes(b"not a png", "garbage").unwrap_err();
        assert!(matches!(err, InitError::Image { .. }));
        assert!(err.to_string().contains("garbage"));
    }
}
