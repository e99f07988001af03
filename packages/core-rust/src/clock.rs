//! Wall-clock abstraction used to stamp operation metadata.
//!
//! Stamps are taken through a [`ClockSource`] so tests can drive time
//! deterministically with a [`ManualClock`] instead of the real clock.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Abstraction over the system clock for dependency injection.
pub trait ClockSource: Send + Sync {
    /// Returns the current UTC time.
    fn now(&self) -> DateTime<Utc>;
}

/// Default clock source that reads the real system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
///
/// Optionally auto-advances by a fixed step after every reading, which lets a
/// test observe strictly increasing stamps without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    /// Creates a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::zero())
    }

    /// Creates a clock starting at `start` that advances by `step` after each reading.
    #[must_use]
    pub fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            now: Mutex::new(start),
            step,
        }
    }

    /// Moves the clock to an absolute instant (may move backwards).
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    /// Moves the clock by `by` (negative values move it backwards).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock();
        let reading = *now;
        *now += self.step;
        reading
    }
}
