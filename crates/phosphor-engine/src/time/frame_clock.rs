use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Per-window frame pacing.
///
/// Produces `FrameTime` snapshots and, when a target rate is set, the instant
/// at which the next frame should start. Delta time is clamped so a debugger
/// pause or a minimized window does not produce a huge step.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    frame_interval: Option<Duration>,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates an unpaced clock (redraw as fast as the present mode allows).
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
            frame_index: 0,
            frame_interval: None,
            dt_max: Duration::from_millis(250),
        }
    }

    /// Creates a clock paced to `fps` frames per second. Zero disables pacing.
    pub fn paced(fps: u32) -> Self {
        Self {
            frame_interval: frame_interval(fps),
            ..Self::new()
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now.saturating_duration_since(self.last).min(self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Instant at which the next frame is due, or `None` when unpaced.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.frame_interval.map(|interval| self.last + interval)
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

fn frame_interval(fps: u32) -> Option<Duration> {
    (fps > 0).then(|| Duration::from_secs_f64(1.0 / fps as f64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_index_increments_per_tick() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let a = clock.tick_at(start + Duration::from_millis(16));
        let b = clock.tick_at(start + Duration::from_millis(32));
        assert_eq!(a.frame_index, 0);
        assert_eq!(b.frame_index, 1);
        assert!((b.dt - 0.016).abs() < 1e-4);
    }

    #[test]
    fn dt_is_clamped_after_stall() {
        let mut clock = FrameClock::new();
        let start = clock.last;
        let ft = clock.tick_at(start + Duration::from_secs(5));
        assert!((ft.dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn paced_clock_reports_deadline() {
        let mut clock = FrameClock::paced(60);
        let start = clock.last;
        clock.tick_at(start);
        let deadline = clock.next_deadline().expect("paced clock has a deadline");
        let interval = deadline - start;
        assert!((interval.as_secs_f64() - 1.0 / 60.0).abs() < 1e-6);
    }

    #[test]
    fn zero_fps_is_unpaced() {
        assert!(FrameClock::paced(0).next_deadline().is_none());
        assert!(FrameClock::new().next_deadline().is_none());
    }
}
