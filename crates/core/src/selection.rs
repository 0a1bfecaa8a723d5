//! Primary/fallback selection after a failed primary call

use feedline_common::resilience::ResilienceFailure;

/// Which source should serve the current call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Primary,
    Fallback,
}

/// Decides, from the error the primary just returned, whether to fall back.
///
/// Consulted once per failed call; nothing is remembered between calls.
/// Callers also fall back on a circuit-open error regardless of what the
/// strategy answers.
pub trait RepositorySelectionStrategy<E>: Send + Sync {
    fn pick(&self, error: &E) -> Selection;
}

/// Fall back only when the primary's breaker is open.
///
/// Any other error is surfaced to the caller so the primary gets retried on
/// the next call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CircuitOpenPreferFallback;

impl<E: ResilienceFailure> RepositorySelectionStrategy<E> for CircuitOpenPreferFallback {
    fn pick(&self, error: &E) -> Selection {
        if error.is_circuit_open() {
            Selection::Fallback
        } else {
            Selection::Primary
        }
    }
}

/// Fall back on every primary failure
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysPreferFallback;

impl<E> RepositorySelectionStrategy<E> for AlwaysPreferFallback {
    fn pick(&self, _error: &E) -> Selection {
        Selection::Fallback
    }
}
