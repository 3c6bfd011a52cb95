use std::time::Duration;

use super::clock::{MonotonicClock, SystemClock};

/// Elapsed-time source for one pipeline instance.
///
/// The epoch is captured at construction and never reset. Readings are
/// clamped so that the reported time never decreases, even if the underlying
/// clock misbehaves.
pub struct PipelineClock {
    source: Box<dyn MonotonicClock>,
    epoch: Duration,
    last: f32,
}

impl PipelineClock {
    /// Creates a clock whose epoch is "now" on the given source.
    pub fn new(source: impl MonotonicClock + 'static) -> Self {
        let epoch = source.now();
        Self {
            source: Box::new(source),
            epoch,
            last: 0.0,
        }
    }

    /// Samples the source and returns seconds since the epoch.
    pub fn elapsed_secs(&mut self) -> f32 {
        let secs = self.source.now().saturating_sub(self.epoch).as_secs_f32();
        if secs > self.last {
            self.last = secs;
        }
        self.last
    }

    /// Returns the most recent reading without sampling the source.
    pub fn last_secs(&self) -> f32 {
        self.last
    }
}

impl Default for PipelineClock {
    fn default() -> Self {
        Self::new(SystemClock::new())
    }
}

impl std::fmt::Debug for PipelineClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineClock")
            .field("epoch", &self.epoch)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
