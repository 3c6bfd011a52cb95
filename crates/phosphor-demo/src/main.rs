use anyhow::Result;
use winit::dpi::{LogicalSize, PhysicalSize};

use phosphor_engine::PipelineError;
use phosphor_engine::core::{App, AppControl, FrameCtx};
use phosphor_engine::device::GpuInit;
use phosphor_engine::logging::{LoggingConfig, init_logging};
use phosphor_engine::render::crt::{CrtConfig, CrtPipeline, FrameBuffer, FrameStatus};
use phosphor_engine::window::{Runtime, RuntimeConfig};

const BACKGROUND: [u8; 4] = [0, 40, 20, 255];
const PHOSPHOR_GREEN: [u8; 4] = [0, 255, 80, 255];
const CIRCLE_RADIUS: f32 = 100.0;

/// Draws a green disc on a dark background, top row first.
fn rasterize(width: u32, height: u32) -> Vec<u8> {
    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    let r2 = CIRCLE_RADIUS * CIRCLE_RADIUS;

    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let px = if dx * dx + dy * dy <= r2 {
                PHOSPHOR_GREEN
            } else {
                BACKGROUND
            };
            pixels.extend_from_slice(&px);
        }
    }
    pixels
}

#[derive(Default)]
struct Demo {
    pipeline: Option<CrtPipeline>,
    pixels: Vec<u8>,
}

impl Demo {
    /// Rebuilds the pipeline and the CPU frame when the surface size changed.
    fn ensure_pipeline(
        &mut self,
        ctx: &FrameCtx<'_, '_>,
        size: (u32, u32),
    ) -> Result<(), PipelineError> {
        if self.pipeline.as_ref().map(CrtPipeline::size) == Some(size) {
            return Ok(());
        }
        let pipeline = CrtPipeline::new(&ctx.render_ctx(), size, CrtConfig::default())?;
        self.pipeline = Some(pipeline);
        self.pixels = rasterize(size.0, size.1);
        Ok(())
    }
}

impl App for Demo {
    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        log::debug!("window resized to {}x{}", size.width, size.height);
        self.pipeline = None;
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let surface = ctx.gpu.size();
        let size = (surface.width, surface.height);
        if size.0 == 0 || size.1 == 0 {
            // Minimized.
            return AppControl::Continue;
        }

        if let Err(err) = self.ensure_pipeline(ctx, size) {
            log::error!("{err}");
            return AppControl::Exit;
        }
        let Some(pipeline) = self.pipeline.as_mut() else {
            return AppControl::Continue;
        };

        let frame = match FrameBuffer::top_left(size.0, size.1, &self.pixels) {
            Ok(frame) => frame,
            Err(err) => {
                log::error!("{err}");
                return AppControl::Exit;
            }
        };

        ctx.window.pre_present_notify();
        match pipeline.draw(ctx.gpu, &frame) {
            Ok(FrameStatus::Presented { time }) => {
                log::trace!("frame {} at t={time:.3}", ctx.time.frame_index);
            }
            Ok(FrameStatus::Skipped(action)) => log::debug!("frame skipped: {action:?}"),
            Err(PipelineError::TargetMismatch { .. }) => self.pipeline = None,
            Err(err) if err.is_recoverable() => log::warn!("{err}"),
            Err(err) => {
                log::error!("{err}");
                return AppControl::Exit;
            }
        }

        AppControl::Continue
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "phosphor".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
        resizable: true,
        target_fps: 60,
    };

    Runtime::run(config, GpuInit::default(), Demo::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(pixels: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        pixels[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn circle_sits_in_the_middle() {
        let pixels = rasterize(1280, 720);
        assert_eq!(pixels.len(), 1280 * 720 * 4);
        assert_eq!(pixel(&pixels, 1280, 640, 360), PHOSPHOR_GREEN);
        assert_eq!(pixel(&pixels, 1280, 0, 0), BACKGROUND);
        assert_eq!(pixel(&pixels, 1280, 640, 360 - 99), PHOSPHOR_GREEN);
        assert_eq!(pixel(&pixels, 1280, 640, 360 - 102), BACKGROUND);
    }

    #[test]
    fn small_targets_are_all_circle() {
        let pixels = rasterize(8, 8);
        assert!(pixels.chunks_exact(4).all(|px| px == PHOSPHOR_GREEN));
    }
}
