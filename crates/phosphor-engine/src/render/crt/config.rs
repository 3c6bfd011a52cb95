/// Effect parameters for the CRT pass.
///
/// `Default` reproduces the reference look; every field maps one-to-one to a
/// value in the shader's uniform block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrtConfig {
    /// Barrel distortion factor applied as `uv + p * |p|² * curve_strength`.
    pub curve_strength: f32,

    /// Distance, in uv units, between the red/green/blue sample points.
    pub chroma_offset: f32,
    /// Direction of the red sample offset; blue uses the opposite direction.
    pub chroma_dir: [f32; 2],

    /// Average luminance above which the glow boost starts.
    pub bloom_threshold: f32,
    pub bloom_gain: f32,

    /// Scanline frequency in radians per output pixel row.
    pub scanline_density: f32,
    /// Gain at the dark and bright ends of the scanline cycle, before the
    /// cycle is halved.
    pub scanline_min: f32,
    pub scanline_max: f32,

    /// Peak-to-peak amplitude of the per-pixel flicker.
    pub flicker_amount: f32,

    /// Radii (aspect-corrected uv units) where the vignette starts and ends.
    pub vignette_inner: f32,
    pub vignette_outer: f32,

    /// Output exponent applied per channel.
    pub gamma: f32,

    /// Color the target is cleared to before the pass.
    pub clear_color: wgpu::Color,
}

impl Default for CrtConfig {
    fn default() -> Self {
        Self {
            curve_strength: 0.12,
            chroma_offset: 0.0025,
            chroma_dir: [1.0, 0.2],
            bloom_threshold: 0.6,
            bloom_gain: 0.08,
            scanline_density: 1.5,
            scanline_min: 0.94,
            scanline_max: 1.06,
            flicker_amount: 0.02,
            vignette_inner: 0.35,
            vignette_outer: 0.8,
            gamma: 0.95,
            clear_color: wgpu::Color::BLACK,
        }
    }
}
