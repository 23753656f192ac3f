//! Contention retry - Re-runs a whole write transaction when `SQLite` reports the
//! database as busy or locked.
//!
//! Only storage contention is retried. Business-rule failures are returned on the
//! first attempt, and an operation that is still contended after the last attempt
//! fails with [`Error::Conflict`].

use crate::errors::{Error, Result};
use std::{future::Future, time::Duration};
use tracing::warn;

/// How often, and how patiently, a contended write is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each further retry
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 10,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retry number `retry` (1-based), capped at one second.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1_u64 << retry.saturating_sub(1).min(16);
        Duration::from_millis(self.base_backoff_ms.saturating_mul(factor).min(1_000))
    }
}

/// Runs `op` until it succeeds, fails with a non-contention error, or the policy
/// runs out of attempts, in which case `Conflict` is returned.
pub async fn with_contention_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match op().await {
            Err(err) if err.is_contention() => {
                warn!("Attempt {}/{} hit contention: {}", attempt, attempts, err);
                last_error = Some(err);
                if attempt < attempts {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
            other => return other,
        }
    }

    Err(Error::Conflict {
        message: format!(
            "gave up after {attempts} attempts: {}",
            last_error.map_or_else(|| "unknown".to_string(), |e| e.to_string())
        ),
    })
}
