//! Delay computation between retry attempts.
//!
//! Attempts are numbered from 1. The delay returned for attempt `n` is the
//! wait *after* attempt `n` failed and before attempt `n + 1` starts.

use std::time::Duration;

use rand::Rng;

use super::error::{ConfigError, ConfigResult};

/// Default initial delay for exponential backoff
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(300);

/// Default growth factor for exponential backoff
pub const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Backoff strategy for calculating retry delays
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Same delay after every attempt
    Fixed(Duration),
    /// `initial_delay * multiplier^(attempt - 1)`, optionally capped
    Exponential { initial_delay: Duration, multiplier: f64, max_delay: Option<Duration> },
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::exponential(DEFAULT_INITIAL_DELAY, DEFAULT_MULTIPLIER)
    }
}

impl BackoffStrategy {
    /// Uncapped exponential backoff.
    pub fn exponential(initial_delay: Duration, multiplier: f64) -> Self {
        Self::Exponential { initial_delay, multiplier, max_delay: None }
    }

    /// Cap every computed delay at `max_delay`.
    ///
    /// Has no effect on [`BackoffStrategy::Fixed`].
    #[must_use]
    pub fn with_max_delay(self, max_delay: Duration) -> Self {
        match self {
            Self::Exponential { initial_delay, multiplier, .. } => {
                Self::Exponential { initial_delay, multiplier, max_delay: Some(max_delay) }
            }
            fixed @ Self::Fixed(_) => fixed,
        }
    }

    /// Delay to wait after the given (1-based) attempt failed.
    ///
    /// Attempt `0` is treated as attempt `1`. Results that overflow saturate
    /// instead of panicking.
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed(delay) => *delay,
            Self::Exponential { initial_delay, multiplier, max_delay } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let nanos = initial_delay.as_nanos() as f64 * multiplier.powi(exponent);
                // `as` saturates on overflow and maps NaN to zero
                let delay = Duration::from_nanos(nanos as u64);
                match max_delay {
                    Some(cap) => delay.min(*cap),
                    None => delay,
                }
            }
        }
    }

    /// Reject multipliers that are negative or not finite.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Self::Exponential { multiplier, .. } = self {
            if !multiplier.is_finite() || *multiplier < 0.0 {
                return Err(ConfigError::invalid(format!(
                    "backoff multiplier must be a finite, non-negative number (got {multiplier})"
                )));
            }
        }
        Ok(())
    }
}

/// Jitter type for adding randomness to retry delays
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Jitter {
    /// No jitter
    #[default]
    None,
    /// Full jitter: 0 to calculated_delay
    Full,
    /// Equal jitter: calculated_delay/2 to calculated_delay
    Equal,
}

impl Jitter {
    /// Apply jitter to the calculated delay
    pub fn apply(self, delay: Duration) -> Duration {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        match self {
            Self::None => delay,
            Self::Full => Duration::from_nanos(random_up_to(nanos)),
            Self::Equal => {
                let half = nanos / 2;
                Duration::from_nanos(half + random_up_to(nanos - half))
            }
        }
    }
}

fn random_up_to(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    rand::thread_rng().gen_range(0..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Validates the exponential formula with the default 300 ms x 2 policy.
    ///
    /// Assertions:
    /// - Confirms attempts 1..=4 yield 300, 600, 1200, 2400 ms.
    #[test]
    fn test_exponential_backoff_doubles_from_initial_delay() {
        let backoff = BackoffStrategy::default();
        let delays: Vec<u128> = (1..=4).map(|n| backoff.delay(n).as_millis()).collect();
        assert_eq!(delays, vec![300, 600, 1200, 2400]);
    }

    #[test]
    fn test_exponential_backoff_with_fractional_multiplier() {
        let backoff = BackoffStrategy::exponential(Duration::from_millis(100), 1.5);
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(150));
        assert_eq!(backoff.delay(3), Duration::from_millis(225));
    }

    /// Validates that the delay never decreases for multipliers of at least 1.
    ///
    /// Assertions:
    /// - Ensures each delay is `>=` its predecessor across 1..=20.
    #[test]
    fn test_exponential_backoff_is_non_decreasing() {
        for multiplier in [1.0, 1.25, 2.0, 3.0] {
            let backoff = BackoffStrategy::exponential(Duration::from_millis(50), multiplier);
            let mut previous = Duration::ZERO;
            for attempt in 1..=20 {
                let delay = backoff.delay(attempt);
                assert!(delay >= previous, "multiplier {multiplier} attempt {attempt}");
                previous = delay;
            }
        }
    }

    #[test]
    fn test_attempt_zero_is_treated_as_first_attempt() {
        let backoff = BackoffStrategy::exponential(Duration::from_millis(300), 2.0);
        assert_eq!(backoff.delay(0), backoff.delay(1));
    }

    #[test]
    fn test_max_delay_caps_growth() {
        let backoff = BackoffStrategy::exponential(Duration::from_millis(300), 2.0)
            .with_max_delay(Duration::from_secs(1));
        assert_eq!(backoff.delay(2), Duration::from_millis(600));
        assert_eq!(backoff.delay(3), Duration::from_secs(1));
        assert_eq!(backoff.delay(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn test_huge_attempt_saturates_without_panicking() {
        let backoff = BackoffStrategy::exponential(Duration::from_secs(1), 10.0);
        assert_eq!(backoff.delay(10_000), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn test_fixed_backoff_ignores_attempt_and_cap() {
        let backoff =
            BackoffStrategy::Fixed(Duration::from_millis(75)).with_max_delay(Duration::from_millis(10));
        assert_eq!(backoff.delay(1), Duration::from_millis(75));
        assert_eq!(backoff.delay(9), Duration::from_millis(75));
    }

    /// Validates multiplier validation.
    ///
    /// Assertions:
    /// - Ensures negative, NaN and infinite multipliers are rejected.
    /// - Ensures zero and fractional multipliers are accepted.
    #[test]
    fn test_validate_rejects_bad_multipliers() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let backoff = BackoffStrategy::exponential(Duration::from_millis(10), bad);
            assert!(backoff.validate().is_err(), "{bad} should be rejected");
        }
        for good in [0.0, 0.5, 2.0] {
            let backoff = BackoffStrategy::exponential(Duration::from_millis(10), good);
            assert!(backoff.validate().is_ok(), "{good} should be accepted");
        }
    }

    #[test]
    fn test_jitter_bounds() {
        let delay = Duration::from_millis(400);
        assert_eq!(Jitter::None.apply(delay), delay);
        for _ in 0..100 {
            assert!(Jitter::Full.apply(delay) <= delay);
            let equal = Jitter::Equal.apply(delay);
            assert!(equal >= Duration::from_millis(200) && equal <= delay);
        }
        assert_eq!(Jitter::Full.apply(Duration::ZERO), Duration::ZERO);
    }
}
