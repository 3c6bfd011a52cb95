//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers, textures) and record
//! into a borrowed `RenderTarget`; the host owns the surface and submission.
//!
//! Convention: texture coordinates have their origin at the bottom-left, so
//! texture row 0 holds the bottom row of the image.

mod ctx;
pub mod crt;

pub use ctx::{RenderCtx, RenderTarget};
