use bytemuck::{Pod, Zeroable};

use super::CrtConfig;

/// Uniform block of the CRT shader (`CrtUniforms` in `crt.wgsl`).
///
/// Field order and sizes mirror the WGSL struct; every `vec2` sits on an
/// 8-byte boundary and the total is a multiple of 16.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable, PartialEq)]
pub(crate) struct CrtUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub curve_strength: f32,
    pub chroma_dir: [f32; 2],
    pub chroma_offset: f32,
    pub bloom_threshold: f32,
    pub bloom_gain: f32,
    pub scanline_density: f32,
    pub scanline_min: f32,
    pub scanline_max: f32,
    pub flicker_amount: f32,
    pub vignette_inner: f32,
    pub vignette_outer: f32,
    pub gamma: f32,
}

impl CrtUniforms {
    pub fn new(resolution: (u32, u32), config: &CrtConfig) -> Self {
        Self {
            resolution: [resolution.0 as f32, resolution.1 as f32],
            time: 0.0,
            curve_strength: config.curve_strength,
            chroma_dir: config.chroma_dir,
            chroma_offset: config.chroma_offset,
            bloom_threshold: config.bloom_threshold,
            bloom_gain: config.bloom_gain,
            scanline_density: config.scanline_density,
            scanline_min: config.scanline_min,
            scanline_max: config.scanline_max,
            flicker_amount: config.flicker_amount,
            vignette_inner: config.vignette_inner,
            vignette_outer: config.vignette_outer,
            gamma: config.gamma,
        }
    }

    pub fn min_binding_size() -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(std::mem::size_of::<Self>() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{offset_of, size_of};

    #[test]
    fn layout_matches_wgsl() {
        assert_eq!(size_of::<CrtUniforms>(), 64);
        assert_eq!(offset_of!(CrtUniforms, resolution), 0);
        assert_eq!(offset_of!(CrtUniforms, time), 8);
        assert_eq!(offset_of!(CrtUniforms, chroma_dir), 16);
        assert_eq!(offset_of!(CrtUniforms, gamma), 60);
    }

    #[test]
    fn built_from_config() {
        let u = CrtUniforms::new((640, 480), &CrtConfig::default());
        assert_eq!(u.resolution, [640.0, 480.0]);
        assert_eq!(u.time, 0.0);
        assert_eq!(u.curve_strength, 0.12);
        assert_eq!(u.chroma_dir, [1.0, 0.2]);
    }
}
