use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::Clock;

/// Doubling backoff: attempt `n` is followed by a `base * 2^(n-1)` pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    /// Pause after the first failure
    pub base: Duration,
    /// Total attempts, including the first
    pub max_attempts: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            max_attempts: 4,
        }
    }
}

impl ExponentialBackoff {
    /// Pause after attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `op` until it succeeds, fails with an error `retryable` rejects,
    /// or the attempts run out. Returns the last error.
    pub async fn retry<T, E, F, Fut>(
        &self,
        clock: &dyn Clock,
        what: &str,
        retryable: impl Fn(&E) -> bool,
        mut op: F,
    ) -> Result<T, E>
    where
        E: std::fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(err) if !retryable(&err) || attempt >= self.max_attempts => {
                    warn!(what, attempt, error = %err, "Giving up");
                    return Err(err);
                }
                Err(err) => {
                    let backoff = self.backoff(attempt);
                    debug!(what, attempt, backoff_ms = backoff.as_millis() as u64, error = %err, "Retrying");
                    clock.sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}
