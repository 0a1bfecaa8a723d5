//! Per-attempt deadline enforcement.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::error::{ConfigError, ConfigResult, ResilienceFailure};

/// Fails an attempt with the error type's timeout variant once `limit` has
/// elapsed.
///
/// Holds no shared state; every call gets a fresh deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutGuard {
    limit: Duration,
}

impl TimeoutGuard {
    /// Create a guard with the given limit. A zero limit is rejected.
    pub fn new(limit: Duration) -> ConfigResult<Self> {
        if limit.is_zero() {
            return Err(ConfigError::invalid("timeout must be greater than 0"));
        }
        Ok(Self { limit })
    }

    /// The configured limit
    pub fn limit(&self) -> Duration {
        self.limit
    }

    /// Await `future`, giving up after the limit.
    ///
    /// On expiry the future is dropped, which cancels whatever it was
    /// awaiting, and `E::timed_out(limit)` is returned.
    pub async fn execute<Fut, T, E>(&self, future: Fut) -> Result<T, E>
    where
        Fut: Future<Output = Result<T, E>>,
        E: ResilienceFailure,
    {
        match tokio::time::timeout(self.limit, future).await {
            Ok(result) => result,
            Err(_) => {
                debug!(limit_ms = self.limit.as_millis() as u64, "attempt timed out");
                Err(E::timed_out(self.limit))
            }
        }
    }

    /// Like [`execute`](Self::execute), but hands the operation a
    /// [`CancellationToken`] that is cancelled when the deadline fires.
    ///
    /// Use this when the operation spawns work that outlives its own future
    /// (a background task, a blocking call) and should stop once nobody is
    /// waiting for the result. The token is also cancelled if the returned
    /// future is itself dropped before completion.
    pub async fn execute_with_token<F, Fut, T, E>(&self, operation: F) -> Result<T, E>
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: ResilienceFailure,
    {
        let token = CancellationToken::new();
        let cancel_on_drop = token.clone().drop_guard();

        match tokio::time::timeout(self.limit, operation(token)).await {
            Ok(result) => {
                drop(cancel_on_drop.disarm());
                result
            }
            Err(_) => {
                drop(cancel_on_drop);
                debug!(
                    limit_ms = self.limit.as_millis() as u64,
                    "attempt timed out, cancellation signalled"
                );
                Err(E::timed_out(self.limit))
            }
        }
    }
}
