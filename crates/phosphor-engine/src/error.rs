use thiserror::Error;

/// Errors surfaced by the CRT pipeline.
///
/// Construction failures (`Init`, `ShaderCompilation`, `ResourceExhausted`)
/// leave no usable pipeline. Per-frame failures (`DimensionMismatch`,
/// `BufferLength`) leave all GPU state untouched and the caller may retry
/// with a corrected buffer.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline initialization failed: {0}")]
    Init(String),

    #[error("CRT shader failed to compile:\n{0}")]
    ShaderCompilation(String),

    #[error("{what} of {requested} exceeds the device limit of {limit}")]
    ResourceExhausted {
        what: &'static str,
        requested: u64,
        limit: u64,
    },

    #[error(
        "frame buffer is {}x{} but the pipeline texture is {}x{}",
        actual.0, actual.1, expected.0, expected.1
    )]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("frame buffer holds {actual} bytes, expected {expected} for RGBA8")]
    BufferLength { expected: usize, actual: usize },

    #[error(
        "render target is {}x{} but the pipeline was built for {}x{}; rebuild the pipeline",
        target.0, target.1, pipeline.0, pipeline.1
    )]
    TargetMismatch {
        pipeline: (u32, u32),
        target: (u32, u32),
    },

    #[error(
        "render target format is {target:?} but the pipeline was built for {pipeline:?}"
    )]
    FormatMismatch {
        pipeline: wgpu::TextureFormat,
        target: wgpu::TextureFormat,
    },

    #[error("presentation surface lost")]
    SurfaceLost,

    #[error("texture readback failed: {0}")]
    Readback(String),
}

impl PipelineError {
    /// Returns true for errors the caller can recover from by fixing its
    /// input and calling again.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PipelineError::DimensionMismatch { .. } | PipelineError::BufferLength { .. }
        )
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_names_both_sizes() {
        let err = PipelineError::DimensionMismatch {
            expected: (64, 64),
            actual: (32, 32),
        };
        assert_eq!(
            err.to_string(),
            "frame buffer is 32x32 but the pipeline texture is 64x64"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn init_failures_are_fatal() {
        let compile = PipelineError::ShaderCompilation("x".into());
        assert!(!compile.is_recoverable());
        assert!(!PipelineError::SurfaceLost.is_recoverable());
        let exhausted = PipelineError::ResourceExhausted {
            what: "texture width",
            requested: 100_000,
            limit: 8192,
        };
        assert!(!exhausted.is_recoverable());
        assert!(exhausted.to_string().contains("8192"));
    }
}
