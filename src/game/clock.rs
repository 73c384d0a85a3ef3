//! Simulation Clock
//!
//! Source of `now_ms` for the tick loop. Wall-clock matches use the
//! monotonic variant; tests and replays use the stepped variant, which
//! advances a fixed amount per reading and is fully deterministic.

use std::time::Instant;

use crate::game::command::TimeMs;

/// Simulation clock.
#[derive(Debug, Clone)]
pub enum SimClock {
    /// Elapsed wall time since `start`, multiplied by `time_factor`
    Monotonic {
        /// Origin
        start: Instant,
        /// Integer speed-up applied after the elapsed time is measured
        time_factor: i64,
    },
    /// Advances by `step` on every reading
    Stepped {
        /// Last reading
        now: TimeMs,
        /// Increment per reading
        step: TimeMs,
    },
}

impl SimClock {
    /// Monotonic clock starting now.
    pub fn monotonic(time_factor: i64) -> Self {
        SimClock::Monotonic {
            start: Instant::now(),
            time_factor: time_factor.max(1),
        }
    }

    /// Stepped clock. The first reading returns `start + step`.
    pub fn stepped(start: TimeMs, step: TimeMs) -> Self {
        SimClock::Stepped { now: start, step }
    }

    /// Read the clock.
    pub fn now_ms(&mut self) -> TimeMs {
        match self {
            SimClock::Monotonic { start, time_factor } => {
                let elapsed = start.elapsed().as_millis() as TimeMs;
                elapsed.saturating_mul(*time_factor)
            }
            SimClock::Stepped { now, step } => {
                *now += *step;
                *now
            }
        }
    }

    /// Last value without advancing a stepped clock.
    pub fn peek_ms(&self) -> TimeMs {
        match self {
            SimClock::Monotonic { start, time_factor } => {
                (start.elapsed().as_millis() as TimeMs).saturating_mul(*time_factor)
            }
            SimClock::Stepped { now, .. } => *now,
        }
    }

    /// Is this a deterministic clock?
    pub fn is_stepped(&self) -> bool {
        matches!(self, SimClock::Stepped { .. })
    }
}
