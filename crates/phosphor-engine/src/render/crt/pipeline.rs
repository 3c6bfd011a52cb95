use crate::device::{Gpu, SurfaceErrorAction};
use crate::error::{PipelineError, Result};
use crate::render::{RenderCtx, RenderTarget};
use crate::time::{MonotonicClock, PipelineClock, SystemClock};

use super::CrtConfig;
use super::geometry::FullscreenQuad;
use super::program::CrtProgram;
use super::readback;
use super::uploader::{FrameBuffer, SurfaceUploader};

/// Outcome of [`CrtPipeline::draw`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameStatus {
    /// The frame was submitted and presented; `time` is the shader time used.
    Presented { time: f32 },
    /// The surface could not provide a frame; nothing was uploaded or drawn.
    Skipped(SurfaceErrorAction),
}

/// CRT post-processing pass for a fixed-size target.
///
/// Owns the screen texture, the quad, the compiled program and the clock.
/// The render target itself belongs to the host and is borrowed per frame.
/// A target resize requires building a new pipeline.
pub struct CrtPipeline {
    program: CrtProgram,
    quad: FullscreenQuad,
    uploader: SurfaceUploader,
    bind_group: wgpu::BindGroup,
    clock: PipelineClock,
    config: CrtConfig,
    size: (u32, u32),
    frames: u64,
}

impl CrtPipeline {
    /// Builds the pipeline for a `size` target in `ctx.target_format`.
    pub fn new(ctx: &RenderCtx<'_>, size: (u32, u32), config: CrtConfig) -> Result<Self> {
        Self::with_clock(ctx, size, config, SystemClock::new())
    }

    /// Like [`CrtPipeline::new`] with an explicit time source.
    pub fn with_clock(
        ctx: &RenderCtx<'_>,
        size: (u32, u32),
        config: CrtConfig,
        clock: impl MonotonicClock + 'static,
    ) -> Result<Self> {
        check_size(size, &ctx.device.limits())?;

        let program = CrtProgram::new(ctx, size, &config)?;
        let quad = FullscreenQuad::new(ctx.device);
        let uploader = SurfaceUploader::new(ctx.device, size);
        let bind_group = program.bind(ctx.device, &uploader);

        log::info!(
            "crt pipeline ready: {}x{} -> {:?}",
            size.0,
            size.1,
            ctx.target_format
        );

        Ok(Self {
            program,
            quad,
            uploader,
            bind_group,
            clock: PipelineClock::new(clock),
            config,
            size,
            frames: 0,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn config(&self) -> &CrtConfig {
        &self.config
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.program.target_format()
    }

    /// Shader time written by the most recent frame.
    pub fn last_time(&self) -> f32 {
        self.program.time()
    }

    /// Number of frames encoded so far.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Reads the screen texture back as tight RGBA8, bottom row first.
    ///
    /// This is the last frame accepted by `encode`, after row normalization.
    pub fn read_screen(&self, ctx: &RenderCtx<'_>) -> Result<Vec<u8>> {
        readback::read_rgba8(ctx.device, ctx.queue, self.uploader.texture())
    }

    /// Checks that `frame` fits this pipeline. No GPU work.
    pub fn validate(&self, frame: &FrameBuffer<'_>) -> Result<()> {
        self.uploader.validate(frame)
    }

    /// Uploads `frame` and records the CRT pass into `target`.
    ///
    /// The texture and uniform writes are queued on `ctx.queue`, so they are
    /// visible to the command buffer `target.encoder` ends up in. Record at
    /// most one frame per submission. Returns the shader time used.
    pub fn encode(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        frame: &FrameBuffer<'_>,
    ) -> Result<f32> {
        self.uploader.upload(ctx.queue, frame)?;

        let time = self.clock.elapsed_secs();
        self.program.write_time(ctx.queue, time);

        {
            let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("phosphor crt pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target.color_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.config.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            rpass.set_pipeline(self.program.pipeline());
            rpass.set_bind_group(0, &self.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.quad.vertex_buffer().slice(..));
            rpass.draw(0..self.quad.vertex_count(), 0..1);
        }

        self.frames += 1;
        Ok(time)
    }

    /// Uploads, renders and presents one frame on the window surface.
    ///
    /// Input is validated before the surface is touched: a mismatched buffer
    /// returns `DimensionMismatch` with the texture, uniforms and clock as
    /// they were. A surface of another size or format is rejected with
    /// `TargetMismatch` or `FormatMismatch`.
    pub fn draw(&mut self, gpu: &mut Gpu<'_>, frame: &FrameBuffer<'_>) -> Result<FrameStatus> {
        self.validate(frame)?;

        let surface = gpu.size();
        check_target(
            (self.size, self.program.target_format()),
            ((surface.width, surface.height), gpu.surface_format()),
        )?;

        let mut gpu_frame = match gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                return match gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(PipelineError::SurfaceLost),
                    action => {
                        log::debug!("crt frame skipped: {action:?}");
                        Ok(FrameStatus::Skipped(action))
                    }
                };
            }
        };

        let time = {
            let ctx = gpu.render_ctx();
            let mut target = RenderTarget::new(&mut gpu_frame.encoder, &gpu_frame.view);
            self.encode(&ctx, &mut target, frame)?
        };

        gpu.submit(gpu_frame);
        Ok(FrameStatus::Presented { time })
    }

    /// Renders `frame` into a new texture owned by the caller and submits it.
    pub fn render_offscreen(
        &mut self,
        ctx: &RenderCtx<'_>,
        frame: &FrameBuffer<'_>,
    ) -> Result<OffscreenFrame> {
        self.validate(frame)?;

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("phosphor crt offscreen target"),
            size: wgpu::Extent3d {
                width: self.size.0,
                height: self.size.1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.program.target_format(),
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("phosphor crt offscreen encoder"),
            });
        let time = {
            let mut target = RenderTarget::new(&mut encoder, &view);
            self.encode(ctx, &mut target, frame)?
        };
        ctx.queue.submit(std::iter::once(encoder.finish()));

        Ok(OffscreenFrame { texture, time })
    }
}

/// Result of [`CrtPipeline::render_offscreen`].
pub struct OffscreenFrame {
    texture: wgpu::Texture,
    time: f32,
}

impl OffscreenFrame {
    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture
    }

    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Reads the rendered pixels back as tight RGBA8, top row first.
    pub fn read_rgba8(&self, ctx: &RenderCtx<'_>) -> Result<Vec<u8>> {
        readback::read_rgba8(ctx.device, ctx.queue, &self.texture)
    }
}

/// Rejects a surface the pipeline was not built for, before any GPU call.
fn check_target(
    (size, format): ((u32, u32), wgpu::TextureFormat),
    (target_size, target_format): ((u32, u32), wgpu::TextureFormat),
) -> Result<()> {
    if target_size != size {
        return Err(PipelineError::TargetMismatch {
            pipeline: size,
            target: target_size,
        });
    }
    if target_format != format {
        return Err(PipelineError::FormatMismatch {
            pipeline: format,
            target: target_format,
        });
    }
    Ok(())
}

fn check_size(size: (u32, u32), limits: &wgpu::Limits) -> Result<()> {
    let max = limits.max_texture_dimension_2d;
    for (what, value) in [("target width", size.0), ("target height", size.1)] {
        if value == 0 {
            return Err(PipelineError::Init(format!("{what} must be non-zero")));
        }
        if value > max {
            return Err(PipelineError::ResourceExhausted {
                what,
                requested: value as u64,
                limit: max as u64,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_is_an_init_error() {
        let err = check_size((0, 64), &wgpu::Limits::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Init(_)));
    }

    #[test]
    fn oversized_target_exhausts_resources() {
        let limits = wgpu::Limits::downlevel_defaults();
        let too_big = limits.max_texture_dimension_2d + 1;
        let err = check_size((64, too_big), &limits).unwrap_err();
        match err {
            PipelineError::ResourceExhausted {
                what,
                requested,
                limit,
            } => {
                assert_eq!(what, "target height");
                assert_eq!(requested, too_big as u64);
                assert_eq!(limit, limits.max_texture_dimension_2d as u64);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn resized_surface_is_a_target_mismatch() {
        let fmt = wgpu::TextureFormat::Bgra8Unorm;
        let err = check_target(((64, 64), fmt), ((128, 64), fmt)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::TargetMismatch {
                pipeline: (64, 64),
                target: (128, 64)
            }
        ));
    }

    #[test]
    fn surface_format_must_match_pipeline_format() {
        let err = check_target(
            ((64, 64), wgpu::TextureFormat::Rgba8Unorm),
            ((64, 64), wgpu::TextureFormat::Bgra8Unorm),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::FormatMismatch {
                pipeline: wgpu::TextureFormat::Rgba8Unorm,
                target: wgpu::TextureFormat::Bgra8Unorm
            }
        ));
        assert!(!err.is_recoverable());

        let fmt = wgpu::TextureFormat::Bgra8Unorm;
        assert!(check_target(((64, 64), fmt), ((64, 64), fmt)).is_ok());
    }

    #[test]
    fn in_limit_sizes_pass() {
        let limits = wgpu::Limits::downlevel_defaults();
        assert!(check_size((1280, 720), &limits).is_ok());
    }
}
