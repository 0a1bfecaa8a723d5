//! Monotonic time source for the circuit breaker.
//!
//! The breaker only ever asks "how long has it been since I opened?", so the
//! abstraction is a single `now()` returning an [`Instant`]. Production code
//! uses [`SystemClock`]; tests drive cooldowns with [`MockClock`] instead of
//! sleeping.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of monotonic instants.
pub trait Clock: Send + Sync + 'static {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same elapsed offset, so a test can keep one handle and
/// give the other to a breaker.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a mock clock frozen at the current instant
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) += duration;
    }

    /// Advance the mock clock by milliseconds
    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    /// Set the total offset from the starting instant.
    pub fn set_elapsed(&self, duration: Duration) {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner) = duration;
    }

    /// Offset from the starting instant.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates that `MockClock::advance` moves `now()` by exactly the
    /// requested amount.
    ///
    /// Assertions:
    /// - Confirms `after.duration_since(before)` equals 1500 ms.
    #[test]
    fn test_mock_clock_advance() {
        let clock = MockClock::new();
        let before = clock.now();

        clock.advance(Duration::from_secs(1));
        clock.advance_millis(500);

        assert_eq!(clock.now().duration_since(before), Duration::from_millis(1500));
    }

    /// Validates that clones of a `MockClock` observe the same time.
    ///
    /// Assertions:
    /// - Confirms both handles report the offset set through either one.
    #[test]
    fn test_mock_clock_clones_share_offset() {
        let clock = MockClock::new();
        let handle = clock.clone();

        handle.set_elapsed(Duration::from_secs(10));
        assert_eq!(clock.elapsed(), Duration::from_secs(10));

        clock.advance(Duration::from_secs(5));
        assert_eq!(handle.elapsed(), Duration::from_secs(15));
        assert_eq!(clock.now(), handle.now());
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        assert!(clock.now() >= first);
    }
}
