//! Phosphor engine crate.
//!
//! CRT post-processing for CPU-rendered frames: the window and GPU runtime,
//! the upload/draw pipeline, and a CPU model of the shader.

pub mod core;
pub mod device;
pub mod time;
pub mod window;

pub mod error;
pub mod logging;
pub mod render;

pub use error::PipelineError;
