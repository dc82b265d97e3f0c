//! Time source for deadline checks.

use std::sync::Arc;
#[cfg(any(test, feature = "test-util"))]
use std::time::Duration;

#[cfg(any(test, feature = "test-util"))]
use parking_lot::Mutex;
use tokio::time::Instant;

/// Monotonic clock consulted by receipt polling.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The tokio clock. Honours paused time in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Manually driven clock.
///
/// Each call to [`now`](Clock::now) returns the current reading and then
/// advances it by `step`, which models a fixed round-trip per poll.
/// Available to downstream tests through the `test-util` feature.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug)]
pub struct ManualClock {
    current: Mutex<Instant>,
    step: Duration,
}

#[cfg(any(test, feature = "test-util"))]
impl ManualClock {
    pub fn new(step: Duration) -> Self {
        Self {
            current: Mutex::new(Instant::now()),
            step,
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.current.lock() += by;
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let mut current = self.current.lock();
        let reading = *current;
        *current += self.step;
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_steps_per_reading() {
        let clock = ManualClock::new(Duration::from_secs(1));
        let a = clock.now();
        let b = clock.now();
        assert_eq!(b - a, Duration::from_secs(1));

        clock.advance(Duration::from_secs(5));
        let c = clock.now();
        assert_eq!(c - b, Duration::from_secs(6));
    }
}
