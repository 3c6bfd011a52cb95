use std::sync::mpsc;

use crate::error::{PipelineError, Result};

/// Copies a 4-byte-per-texel color texture into a tight RGBA8 buffer.
///
/// Rows come back in texture order (for a render target, row 0 is the top of
/// the rendered image).
/// BGRA textures are swizzled to RGBA. Blocks until the copy has completed.
pub fn read_rgba8(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
) -> Result<Vec<u8>> {
    let format = texture.format();
    let swizzle = match format {
        wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
        wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
        other => {
            return Err(PipelineError::Readback(format!(
                "unsupported readback format {other:?}"
            )));
        }
    };

    let (width, height) = (texture.width(), texture.height());
    let tight_bpr = width as usize * 4;
    let padded_bpr = align_bytes_per_row(tight_bpr);

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("phosphor readback staging"),
        size: (padded_bpr * height as usize) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("phosphor readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &staging,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bpr as u32),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = staging.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|err| PipelineError::Readback(err.to_string()))?;
    rx.recv()
        .map_err(|_| PipelineError::Readback("map callback dropped".into()))?
        .map_err(|err| PipelineError::Readback(err.to_string()))?;

    let mut tight = {
        let data = slice.get_mapped_range();
        depad_rows(&data, padded_bpr, tight_bpr, height as usize)
    };
    staging.unmap();

    if swizzle {
        for px in tight.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
    }
    Ok(tight)
}

fn align_bytes_per_row(bytes: usize) -> usize {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT as usize;
    bytes.div_ceil(align) * align
}

fn depad_rows(data: &[u8], padded_bpr: usize, tight_bpr: usize, rows: usize) -> Vec<u8> {
    let mut tight = Vec::with_capacity(tight_bpr * rows);
    for row in data.chunks_exact(padded_bpr).take(rows) {
        tight.extend_from_slice(&row[..tight_bpr]);
    }
    tight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_align_to_copy_alignment() {
        assert_eq!(align_bytes_per_row(4), 256);
        assert_eq!(align_bytes_per_row(256), 256);
        assert_eq!(align_bytes_per_row(64 * 4 + 1), 512);
    }

    #[test]
    fn padding_is_stripped() {
        // Two rows of 3 meaningful bytes padded to 8.
        let data = [1, 2, 3, 0, 0, 0, 0, 0, 4, 5, 6, 0, 0, 0, 0, 0];
        assert_eq!(depad_rows(&data, 8, 3, 2), vec![1, 2, 3, 4, 5, 6]);
    }
}
