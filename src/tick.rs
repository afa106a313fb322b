use std::time::{Duration, Instant};

/// Fixed-rate tick timer.
///
/// The event loop sleeps until [`next_tick`](Self::next_tick) and then asks
/// [`poll`](Self::poll) whether a frame is due. At most one tick fires per
/// poll; if the loop fell more than a full period behind, the missed ticks are
/// dropped and the schedule re-anchors on the current time.
#[derive(Debug, Clone)]
pub struct TickScheduler {
    interval: Duration,
    next_tick: Instant,
    tick_count: u64,
}

impl TickScheduler {
    /// Create a scheduler firing `rate_hz` times per second, first tick due at `start`.
    ///
    /// A non-positive or non-finite rate falls back to 60 Hz.
    pub fn new(rate_hz: f64, start: Instant) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 {
            rate_hz
        } else {
            60.0
        };
        Self {
            interval: Duration::from_secs_f64(1.0 / rate),
            next_tick: start,
            tick_count: 0,
        }
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Provides the next time that this timer will tick.
    pub fn next_tick(&self) -> Instant {
        self.next_tick
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Returns `true` and advances the schedule if a tick is due at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next_tick {
            return false;
        }

        self.next_tick += self.interval;
        if self.next_tick <= now {
            self.next_tick = now + self.interval;
        }
        self.tick_count += 1;
        true
    }
}
