//! Monotonic millisecond clock shared by the link driver and its consumers.

use tokio::time::Instant;

/// Millisecond tick counter anchored at link start
///
/// Readings are `u32` and wrap after ~49 days, like a firmware tick count;
/// compute ages with [`Clock::age_ms`] rather than plain subtraction.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    epoch: Instant,
}

impl Clock {
    /// Start a clock at the current instant
    pub fn start() -> Self {
        Self { epoch: Instant::now() }
    }

    /// Instant the clock reads zero at
    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Milliseconds since start
    pub fn now_ms(&self) -> u32 {
        self.ms_at(Instant::now())
    }

    /// Clock reading at a given instant
    pub fn ms_at(&self, instant: Instant) -> u32 {
        instant.saturating_duration_since(self.epoch).as_millis() as u32
    }

    /// Milliseconds elapsed between `timestamp_ms` and `now_ms`
    pub fn age_ms(timestamp_ms: u32, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(timestamp_ms)
    }
}
