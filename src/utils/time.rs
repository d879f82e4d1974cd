use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
enum ClockMode {
    RealTime { last_update: Instant },
    Fixed { step: Duration },
}

/// Frame clock providing `delta_seconds` per tick.
///
/// In real-time mode the delta is the wall time since the previous tick; in
/// fixed mode every tick advances by the same step, which keeps offline runs
/// and tests deterministic.
#[derive(Debug, Clone)]
pub struct FrameClock {
    mode: ClockMode,
    /// Time since last tick
    pub delta: Duration,
    /// Total time accumulated over all ticks
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::real_time()
    }
}

impl FrameClock {
    /// Clock driven by wall time, starting now.
    #[must_use]
    pub fn real_time() -> Self {
        Self::with_mode(ClockMode::RealTime {
            last_update: Instant::now(),
        })
    }

    /// Clock that advances by `step` on every tick.
    #[must_use]
    pub fn fixed(step: Duration) -> Self {
        Self::with_mode(ClockMode::Fixed { step })
    }

    /// Fixed clock ticking `rate` times per second.
    #[must_use]
    pub fn fixed_rate(rate: f64) -> Self {
        let step = if rate > 0.0 {
            Duration::from_secs_f64(1.0 / rate)
        } else {
            Duration::ZERO
        };
        Self::fixed(step)
    }

    fn with_mode(mode: ClockMode) -> Self {
        Self {
            mode,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances the clock and returns the new delta in seconds.
    pub fn tick(&mut self) -> f32 {
        self.delta = match &mut self.mode {
            ClockMode::RealTime { last_update } => {
                let now = Instant::now();
                let delta = now - *last_update;
                *last_update = now;
                delta
            }
            ClockMode::Fixed { step } => *step,
        };
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.delta_seconds()
    }

    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    #[must_use]
    pub fn is_fixed(&self) -> bool {
        matches!(self.mode, ClockMode::Fixed { .. })
    }
}
