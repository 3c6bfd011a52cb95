//! Time subsystem.
//!
//! - `MonotonicClock`: injectable time source (`SystemClock`, `ManualClock`)
//! - `PipelineClock`: per-pipeline elapsed time fed to shaders, never decreasing
//! - `FrameClock`: per-window frame pacing used by the runtime loop

mod clock;
mod frame_clock;
mod pipeline_clock;

pub use clock::{ManualClock, MonotonicClock, SystemClock};
pub use frame_clock::{FrameClock, FrameTime};
pub use pipeline_clock::PipelineClock;
