//! CPU model of the CRT fragment shader.
//!
//! Mirrors `shaders/crt.wgsl` step for step so the effect math can be checked
//! (and used for previews) without a GPU. Sampling is nearest-neighbour with
//! clamp-to-edge addressing, like the pipeline's sampler.

use super::CrtConfig;

/// Per-frame inputs shared by every fragment.
#[derive(Debug, Clone, Copy)]
pub struct FragmentInputs<'a> {
    pub resolution: (u32, u32),
    pub time: f32,
    pub config: &'a CrtConfig,
}

impl FragmentInputs<'_> {
    fn aspect(&self) -> f32 {
        self.resolution.0 as f32 / self.resolution.1 as f32
    }
}

/// Barrel distortion of `uv` with aspect correction.
pub fn lens_distort(uv: [f32; 2], aspect: f32, curve_strength: f32) -> [f32; 2] {
    let p = [(uv[0] * 2.0 - 1.0) * aspect, uv[1] * 2.0 - 1.0];
    let r2 = p[0] * p[0] + p[1] * p[1];
    [
        uv[0] + p[0] * r2 * curve_strength,
        uv[1] + p[1] * r2 * curve_strength,
    ]
}

/// True when a distorted coordinate falls off the tube face.
pub fn is_clipped(distorted: [f32; 2]) -> bool {
    distorted.iter().any(|&c| !(0.0..=1.0).contains(&c))
}

/// Stable 2D hash in `[0, 1)`.
pub fn hash21(v: [f32; 2]) -> f32 {
    let mut p = [fract(v[0] * 123.34), fract(v[1] * 456.21)];
    let d = p[0] * (p[0] + 45.32) + p[1] * (p[1] + 45.32);
    p[0] += d;
    p[1] += d;
    fract(p[0] * p[1])
}

/// Multiplicative scanline gain for the row at `uv_y`.
pub fn scanline_gain(uv_y: f32, height: f32, config: &CrtConfig) -> f32 {
    let scanline = (uv_y * height * config.scanline_density).sin() * 0.5 + 0.5;
    mix(config.scanline_min, config.scanline_max, scanline * 0.5)
}

/// Multiplicative flicker gain for one fragment at `time`.
pub fn flicker_gain(uv: [f32; 2], resolution: [f32; 2], time: f32, config: &CrtConfig) -> f32 {
    let n = hash21([uv[0] * resolution[0] + time, uv[1] * resolution[1] + time]);
    1.0 + (n - 0.5) * config.flicker_amount
}

/// Vignette factor: 1 inside `vignette_inner`, 0 beyond `vignette_outer`.
pub fn vignette(uv: [f32; 2], aspect: f32, config: &CrtConfig) -> f32 {
    let dx = (uv[0] - 0.5) * aspect;
    let dy = uv[1] - 0.5;
    let d = (dx * dx + dy * dy).sqrt();
    1.0 - smoothstep(config.vignette_inner, config.vignette_outer, d)
}

/// Shades one fragment. `sample` returns RGBA in `[0, 1]` for a texture
/// coordinate (bottom-left origin).
pub fn shade<F>(uv: [f32; 2], inputs: &FragmentInputs<'_>, sample: F) -> [f32; 4]
where
    F: Fn([f32; 2]) -> [f32; 4],
{
    let cfg = inputs.config;
    let aspect = inputs.aspect();
    let resolution = [inputs.resolution.0 as f32, inputs.resolution.1 as f32];

    let distorted = lens_distort(uv, aspect, cfg.curve_strength);
    if is_clipped(distorted) {
        return [0.0; 4];
    }

    let ca = [cfg.chroma_dir[0] * cfg.chroma_offset, cfg.chroma_dir[1] * cfg.chroma_offset];
    let mut col = [
        sample([distorted[0] + ca[0], distorted[1] + ca[1]])[0],
        sample(distorted)[1],
        sample([distorted[0] - ca[0], distorted[1] - ca[1]])[2],
    ];

    let bright = ((col[0] + col[1] + col[2]) / 3.0 - cfg.bloom_threshold).clamp(0.0, 1.0);
    let glow = bright * bright * cfg.bloom_gain;

    let gain = scanline_gain(uv[1], resolution[1], cfg)
        * flicker_gain(uv, resolution, inputs.time, cfg)
        * vignette(uv, aspect, cfg);

    for c in &mut col {
        *c = ((*c + glow) * gain).max(0.0).powf(cfg.gamma);
    }
    [col[0], col[1], col[2], 1.0]
}

/// Renders a whole RGBA8 image through [`shade`].
///
/// `pixels` is bottom-left origin (row 0 is the bottom row), as uploaded to
/// the GPU. The result uses the same row order.
pub fn render_rgba8(pixels: &[u8], inputs: &FragmentInputs<'_>) -> Vec<u8> {
    let (w, h) = inputs.resolution;
    let sample = |coord: [f32; 2]| sample_nearest(pixels, w, h, coord);

    let mut out = Vec::with_capacity(pixels.len());
    for y in 0..h {
        for x in 0..w {
            let uv = [(x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32];
            let rgba = shade(uv, inputs, sample);
            for c in rgba {
                out.push(to_unorm8(c));
            }
        }
    }
    out
}

fn sample_nearest(pixels: &[u8], w: u32, h: u32, coord: [f32; 2]) -> [f32; 4] {
    let x = texel(coord[0], w);
    let y = texel(coord[1], h);
    let i = (y * w as usize + x) * 4;
    let px = &pixels[i..i + 4];
    [
        px[0] as f32 / 255.0,
        px[1] as f32 / 255.0,
        px[2] as f32 / 255.0,
        px[3] as f32 / 255.0,
    ]
}

// Clamp-to-edge addressing.
fn texel(coord: f32, extent: u32) -> usize {
    let i = (coord * extent as f32).floor() as i64;
    i.clamp(0, extent as i64 - 1) as usize
}

fn to_unorm8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

// WGSL semantics: fract(x) = x - floor(x), smoothstep clamps t.
fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(config: &CrtConfig, size: (u32, u32), time: f32) -> FragmentInputs<'_> {
        FragmentInputs {
            resolution: size,
            time,
            config,
        }
    }

    fn gray(_: [f32; 2]) -> [f32; 4] {
        let v = 128.0 / 255.0;
        [v, v, v, 1.0]
    }

    #[test]
    fn center_maps_to_itself() {
        for aspect in [0.5, 1.0, 16.0 / 9.0] {
            assert_eq!(lens_distort([0.5, 0.5], aspect, 0.12), [0.5, 0.5]);
        }
    }

    #[test]
    fn distortion_pushes_outward() {
        let d = lens_distort([0.9, 0.5], 1.0, 0.12);
        assert!(d[0] > 0.9);
        assert_eq!(d[1], 0.5);
    }

    #[test]
    fn corners_are_transparent() {
        let cfg = CrtConfig::default();
        let inp = inputs(&cfg, (64, 64), 0.0);
        for uv in [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.01, 0.99]] {
            assert_eq!(shade(uv, &inp, gray)[3], 0.0, "uv {uv:?}");
        }
    }

    #[test]
    fn clipped_output_is_fully_zero() {
        let cfg = CrtConfig::default();
        let inp = inputs(&cfg, (320, 240), 3.0);
        assert_eq!(shade([0.0, 0.0], &inp, |_| [1.0; 4]), [0.0; 4]);
    }

    #[test]
    fn hash_stays_in_unit_range() {
        for i in 0..500 {
            let v = [i as f32 * 0.37, i as f32 * 1.91 + 3.0];
            let h = hash21(v);
            assert!((0.0..1.0).contains(&h), "hash21({v:?}) = {h}");
        }
    }

    #[test]
    fn hash_varies_over_time() {
        let a = hash21([10.0, 20.0]);
        let b = hash21([11.0, 21.0]);
        assert_ne!(a, b);
    }

    #[test]
    fn vignette_is_one_at_center_and_zero_at_corner() {
        let cfg = CrtConfig::default();
        assert_eq!(vignette([0.5, 0.5], 1.0, &cfg), 1.0);
        assert_eq!(vignette([0.0, 0.0], 16.0 / 9.0, &cfg), 0.0);
        // On a square target the corner sits inside the falloff band.
        let corner = vignette([0.0, 0.0], 1.0, &cfg);
        assert!(corner < vignette([0.2, 0.2], 1.0, &cfg));
    }

    #[test]
    fn vignette_is_non_increasing_with_radius() {
        let cfg = CrtConfig::default();
        let mut prev = f32::INFINITY;
        for step in 0..=100 {
            let r = step as f32 * 0.5 / 100.0;
            let v = vignette([0.5 + r, 0.5 + r], 1.0, &cfg);
            assert!(v <= prev + 1e-6, "vignette rose at r={r}");
            assert!((0.0..=1.0).contains(&v));
            prev = v;
        }
    }

    #[test]
    fn scanline_gain_stays_in_band() {
        let cfg = CrtConfig::default();
        for row in 0..480 {
            let g = scanline_gain((row as f32 + 0.5) / 480.0, 480.0, &cfg);
            assert!(g >= 0.94 - 1e-6 && g <= 1.0 + 1e-6, "row {row}: {g}");
        }
    }

    #[test]
    fn center_pixel_stable_across_time() {
        let cfg = CrtConfig::default();
        let uv = [32.5 / 64.0, 32.5 / 64.0];
        let a = shade(uv, &inputs(&cfg, (64, 64), 0.0), gray);
        let b = shade(uv, &inputs(&cfg, (64, 64), 1.0), gray);

        for c in 0..3 {
            let rel = (a[c] - b[c]).abs() / a[c];
            assert!(rel <= 0.05, "channel {c}: {} vs {}", a[c], b[c]);
        }
        assert_eq!(a[3], 1.0);
        assert_eq!(b[3], 1.0);
    }

    #[test]
    fn bright_input_gets_glow() {
        let mut cfg = CrtConfig::default();
        let inp = inputs(&cfg, (64, 64), 0.0);
        let with_glow = shade([0.5, 0.5], &inp, |_| [1.0; 4]);

        cfg.bloom_gain = 0.0;
        let inp = inputs(&cfg, (64, 64), 0.0);
        let without = shade([0.5, 0.5], &inp, |_| [1.0; 4]);
        assert!(with_glow[1] > without[1]);
    }

    #[test]
    fn chromatic_aberration_splits_channels() {
        let cfg = CrtConfig::default();
        let inp = inputs(&cfg, (64, 64), 0.0);
        // Red only to the right of the green sample point.
        let sample = |c: [f32; 2]| {
            if c[0] > 0.5 {
                [1.0, 0.0, 0.0, 1.0]
            } else {
                [0.0; 4]
            }
        };
        let out = shade([0.5, 0.5], &inp, sample);
        assert!(out[0] > 0.0);
        assert_eq!(out[1], 0.0);
        assert_eq!(out[2], 0.0);
    }

    #[test]
    fn rendered_image_has_transparent_corners() {
        let cfg = CrtConfig::default();
        let pixels = [128u8, 128, 128, 255].repeat(16 * 16);
        let out = render_rgba8(&pixels, &inputs(&cfg, (16, 16), 0.0));
        assert_eq!(out.len(), pixels.len());
        assert_eq!(out[3], 0);
        let center = ((8 * 16) + 8) * 4;
        assert_eq!(out[center + 3], 255);
    }
}
