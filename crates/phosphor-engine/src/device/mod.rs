//! GPU device + surface management.
//!
//! - creates the wgpu Adapter/Device/Queue, with or without a window
//! - creates & configures the Surface (swapchain)
//! - acquires frames and maps surface errors to actions

mod error;
mod frame;
mod gpu;
mod headless;
mod init;
mod surface;

pub use error::SurfaceErrorAction;
pub use frame::GpuFrame;
pub use gpu::Gpu;
pub use headless::HeadlessGpu;
pub use init::GpuInit;
