use crate::error::{PipelineError, Result};

/// Row order of a CPU frame buffer.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RowOrigin {
    /// First row in memory is the top of the image (most CPU rasterizers).
    #[default]
    TopLeft,
    /// First row in memory is the bottom of the image (GL convention).
    BottomLeft,
}

/// Borrowed RGBA8 pixels for one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameBuffer<'a> {
    width: u32,
    height: u32,
    pixels: &'a [u8],
    origin: RowOrigin,
}

impl<'a> FrameBuffer<'a> {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Wraps `pixels` after checking the slice holds exactly `width * height`
    /// RGBA8 pixels.
    pub fn new(width: u32, height: u32, pixels: &'a [u8], origin: RowOrigin) -> Result<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(Self::BYTES_PER_PIXEL))
            .ok_or(PipelineError::BufferLength {
                expected: usize::MAX,
                actual: pixels.len(),
            })?;
        if pixels.len() != expected {
            return Err(PipelineError::BufferLength {
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self {
            width,
            height,
            pixels,
            origin,
        })
    }

    pub fn top_left(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self> {
        Self::new(width, height, pixels, RowOrigin::TopLeft)
    }

    pub fn bottom_left(width: u32, height: u32, pixels: &'a [u8]) -> Result<Self> {
        Self::new(width, height, pixels, RowOrigin::BottomLeft)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn origin(&self) -> RowOrigin {
        self.origin
    }

    fn row_bytes(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }
}

/// GPU mirror of the host frame.
///
/// The texture is sized once at construction; each upload replaces its full
/// contents. Row 0 of the texture is the bottom row of the image.
pub struct SurfaceUploader {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: (u32, u32),

    // Reused between frames to flip top-left buffers.
    scratch: Vec<u8>,
}

impl SurfaceUploader {
    /// Format the CRT shader samples from.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(device: &wgpu::Device, size: (u32, u32)) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("phosphor crt screen texture"),
            size: extent(size),
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("phosphor crt screen sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size,
            scratch: Vec::new(),
        }
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// The screen texture; row 0 is the bottom row of the image.
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub(crate) fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub(crate) fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    /// Checks `frame` against the texture without touching the GPU.
    pub fn validate(&self, frame: &FrameBuffer<'_>) -> Result<()> {
        check_dimensions(self.size, frame.size())
    }

    /// Replaces the texture contents with `frame`.
    ///
    /// The write is queued on `queue`; it is ordered before any command
    /// buffer submitted afterwards.
    pub fn upload(&mut self, queue: &wgpu::Queue, frame: &FrameBuffer<'_>) -> Result<()> {
        self.validate(frame)?;

        let row_bytes = frame.row_bytes();
        let data = match frame.origin() {
            RowOrigin::BottomLeft => frame.pixels(),
            RowOrigin::TopLeft => {
                flip_rows_into(frame.pixels(), row_bytes, &mut self.scratch);
                &self.scratch
            }
        };

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(row_bytes as u32),
                rows_per_image: Some(self.size.1),
            },
            extent(self.size),
        );
        Ok(())
    }
}

pub(crate) fn check_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected != actual {
        return Err(PipelineError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Copies `src` into `dst` with row order reversed.
pub(crate) fn flip_rows_into(src: &[u8], row_bytes: usize, dst: &mut Vec<u8>) {
    dst.clear();
    if row_bytes == 0 {
        return;
    }
    dst.reserve(src.len());
    for row in src.chunks_exact(row_bytes).rev() {
        dst.extend_from_slice(row);
    }
}

fn extent((width, height): (u32, u32)) -> wgpu::Extent3d {
    wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_checks_length() {
        let pixels = vec![0u8; 4 * 4 * 4];
        assert!(FrameBuffer::top_left(4, 4, &pixels).is_ok());

        let err = FrameBuffer::top_left(4, 5, &pixels).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::BufferLength {
                expected: 80,
                actual: 64
            }
        ));
    }

    #[test]
    fn frame_buffer_defaults_to_top_left() {
        assert_eq!(RowOrigin::default(), RowOrigin::TopLeft);
        let pixels = [0u8; 4];
        let fb = FrameBuffer::bottom_left(1, 1, &pixels).unwrap();
        assert_eq!(fb.origin(), RowOrigin::BottomLeft);
        assert_eq!(fb.size(), (1, 1));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let err = check_dimensions((64, 64), (32, 32)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DimensionMismatch {
                expected: (64, 64),
                actual: (32, 32)
            }
        ));
        assert!(check_dimensions((64, 64), (64, 64)).is_ok());
        assert!(check_dimensions((64, 32), (32, 64)).is_err());
    }

    #[test]
    fn rows_are_reversed() {
        // 2x3 image, one distinct byte value per row.
        let src: Vec<u8> = [1u8, 2, 3]
            .iter()
            .flat_map(|&r| std::iter::repeat_n(r, 8))
            .collect();
        let mut dst = Vec::new();
        flip_rows_into(&src, 8, &mut dst);

        assert_eq!(dst.len(), src.len());
        assert!(dst[..8].iter().all(|&b| b == 3));
        assert!(dst[8..16].iter().all(|&b| b == 2));
        assert!(dst[16..].iter().all(|&b| b == 1));
    }

    #[test]
    fn flip_reuses_scratch() {
        let src = vec![7u8; 16];
        let mut dst = vec![0u8; 64];
        flip_rows_into(&src, 4, &mut dst);
        assert_eq!(dst, src);

        flip_rows_into(&src, 0, &mut dst);
        assert!(dst.is_empty());
    }
}
