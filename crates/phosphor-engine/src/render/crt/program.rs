use crate::error::{PipelineError, Result};
use crate::render::RenderCtx;

use super::CrtConfig;
use super::geometry::QuadVertex;
use super::uniforms::CrtUniforms;
use super::uploader::SurfaceUploader;

pub(crate) const CRT_SHADER: &str = include_str!("shaders/crt.wgsl");

/// Compiled CRT shader, its render pipeline, and the uniform block.
///
/// Bindings (group 0):
/// - 0: `screen_tex`, the uploaded frame
/// - 1: its sampler
/// - 2: `CrtUniforms`
pub struct CrtProgram {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    uniform_buffer: wgpu::Buffer,
    uniforms: CrtUniforms,
    target_format: wgpu::TextureFormat,
}

impl CrtProgram {
    /// Compiles the built-in CRT shader for `ctx.target_format`.
    pub fn new(ctx: &RenderCtx<'_>, resolution: (u32, u32), config: &CrtConfig) -> Result<Self> {
        Self::with_source(ctx, CRT_SHADER, resolution, config)
    }

    /// Compiles a replacement WGSL source with the same interface
    /// (`vs_main`/`fs_main`, bindings 0..=2, `QuadVertex` inputs).
    pub fn with_source(
        ctx: &RenderCtx<'_>,
        source: &str,
        resolution: (u32, u32),
        config: &CrtConfig,
    ) -> Result<Self> {
        // Validate up front: an invalid module handed to wgpu goes to the
        // device's uncaptured-error handler instead of back to us.
        validate_wgsl(source)?;

        let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phosphor crt shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        check_compilation(&shader)?;

        let bind_group_layout =
            ctx.device
                .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("phosphor crt bgl"),
                    entries: &[
                        wgpu::BindGroupLayoutEntry {
                            binding: 0,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Texture {
                                multisampled: false,
                                view_dimension: wgpu::TextureViewDimension::D2,
                                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            },
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 1,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                            count: None,
                        },
                        wgpu::BindGroupLayoutEntry {
                            binding: 2,
                            visibility: wgpu::ShaderStages::FRAGMENT,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: CrtUniforms::min_binding_size(),
                            },
                            count: None,
                        },
                    ],
                });

        let pipeline_layout =
            ctx.device
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: Some("phosphor crt pipeline layout"),
                    bind_group_layouts: &[&bind_group_layout],
                    immediate_size: 0,
                });

        let pipeline = ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("phosphor crt pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[QuadVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.target_format,
                    // Replace, not blend: the clipped border must land as alpha 0.
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let uniforms = CrtUniforms::new(resolution, config);
        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("phosphor crt ubo"),
            size: std::mem::size_of::<CrtUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        ctx.queue
            .write_buffer(&uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        Ok(Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
            uniforms,
            target_format: ctx.target_format,
        })
    }

    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Resolution the program was configured with, in pixels.
    pub fn resolution(&self) -> (u32, u32) {
        let [w, h] = self.uniforms.resolution;
        (w as u32, h as u32)
    }

    /// Last `time` value written to the uniform block.
    pub fn time(&self) -> f32 {
        self.uniforms.time
    }

    /// Queues a uniform update carrying `time`.
    pub(crate) fn write_time(&mut self, queue: &wgpu::Queue, time: f32) {
        self.uniforms.time = time;
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
    }

    /// Binds the uploader's texture and sampler together with the uniforms.
    pub(crate) fn bind(
        &self,
        device: &wgpu::Device,
        uploader: &SurfaceUploader,
    ) -> wgpu::BindGroup {
        debug_assert_eq!(uploader.size(), self.resolution());
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("phosphor crt bind group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(uploader.view()),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(uploader.sampler()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: self.uniform_buffer.as_entire_binding(),
                },
            ],
        })
    }

    pub(crate) fn pipeline(&self) -> &wgpu::RenderPipeline {
        &self.pipeline
    }
}

/// Parses and validates WGSL with naga, reporting diagnostics against
/// `source`.
pub fn validate_wgsl(source: &str) -> Result<()> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| err.emit_to_string(source))
        .map_err(PipelineError::ShaderCompilation)?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|err| err.emit_to_string(source))
    .map_err(PipelineError::ShaderCompilation)?;

    Ok(())
}

fn check_compilation(shader: &wgpu::ShaderModule) -> Result<()> {
    let info = pollster::block_on(shader.get_compilation_info());
    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|m| m.message_type == wgpu::CompilationMessageType::Error)
        .map(|m| m.message.clone())
        .collect();

    for m in &info.messages {
        if m.message_type == wgpu::CompilationMessageType::Warning {
            log::warn!("crt shader: {}", m.message);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::ShaderCompilation(errors.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_shader_validates() {
        validate_wgsl(CRT_SHADER).expect("crt.wgsl must be valid WGSL");
    }

    #[test]
    fn builtin_shader_declares_uniform_fields_in_order() {
        let fields = [
            "resolution",
            "time",
            "curve_strength",
            "chroma_dir",
            "chroma_offset",
            "bloom_threshold",
            "bloom_gain",
            "scanline_density",
            "scanline_min",
            "scanline_max",
            "flicker_amount",
            "vignette_inner",
            "vignette_outer",
            "gamma",
        ];
        let mut cursor = CRT_SHADER
            .find("struct CrtUniforms")
            .expect("uniform struct present");
        for field in fields {
            let needle = format!("{field}:");
            let at = CRT_SHADER[cursor..]
                .find(&needle)
                .unwrap_or_else(|| panic!("{field} missing or out of order"));
            cursor += at + needle.len();
        }
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = validate_wgsl("fn broken( -> {").unwrap_err();
        assert!(matches!(err, PipelineError::ShaderCompilation(_)));
    }

    #[test]
    fn type_errors_are_reported() {
        let src = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = validate_wgsl(src).unwrap_err();
        match err {
            PipelineError::ShaderCompilation(msg) => assert!(!msg.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }
}
