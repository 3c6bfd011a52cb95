//! CRT post-processing pass.
//!
//! A host hands over a rendered RGBA8 frame each tick; the pass uploads it to
//! a texture (`SurfaceUploader`), draws a full-screen quad (`FullscreenQuad`)
//! with the CRT shader (`CrtProgram`), and writes the result into the host's
//! color target. `CrtPipeline` ties the three together.
//!
//! ```text
//!   FrameBuffer ──upload──▶ screen texture ──sample──▶ crt.wgsl ──▶ target
//!                                 ▲                       ▲
//!                     FullscreenQuad (6 verts)    CrtUniforms (time, resolution, ...)
//! ```

mod config;
mod geometry;
mod pipeline;
mod program;
pub mod readback;
pub mod reference;
mod uniforms;
mod uploader;

pub use config::CrtConfig;
pub use geometry::FullscreenQuad;
pub use pipeline::{CrtPipeline, FrameStatus, OffscreenFrame};
pub use program::{CrtProgram, validate_wgsl};
pub use uploader::{FrameBuffer, RowOrigin, SurfaceUploader};
