//! Transient-failure policy for upstream catalog reads.
//!
//! Only the HTTP adapter retries. The engine treats whatever comes back from a
//! source as final.

use std::future::Future;
use std::time::Duration;

use crate::error::SourceError;

/// Upper bound on a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(10);

/// How many times, and how patiently, a failed upstream read is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    max_retries: u32,
    base: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            base: Duration::from_millis(backoff_base_ms),
        }
    }

    /// Timeouts, refused connections and 5xx answers may succeed on a second
    /// try. A 4xx, a body that does not parse or a bad base URL never will.
    pub(crate) fn should_retry(err: &SourceError) -> bool {
        match err {
            SourceError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            SourceError::UnexpectedStatus { status, .. } => (500..600).contains(status),
            SourceError::Deserialize { .. }
            | SourceError::InvalidBaseUrl { .. }
            | SourceError::TaxonomyFile(_) => false,
        }
    }

    /// Sleep before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped, then scaled by `jitter` (expected in `0.75..=1.25`).
    fn delay(&self, retry: u32, jitter: f64) -> Duration {
        let exponent = retry.saturating_sub(1).min(10);
        let nominal = self.base.saturating_mul(1 << exponent).min(MAX_DELAY);
        nominal.mul_f64(jitter)
    }

    /// Runs `read`, repeating it on retryable errors until it succeeds or
    /// the retry budget is spent.
    pub(crate) async fn run<T, F, Fut>(&self, url: &str, mut read: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut retry = 0u32;
        loop {
            let err = match read().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };
            if retry >= self.max_retries || !Self::should_retry(&err) {
                return Err(err);
            }
            retry += 1;
            let delay = self.delay(retry, rand::random::<f64>() * 0.5 + 0.75);
            tracing::warn!(
                url,
                retry,
                max_retries = self.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %err,
                "upstream catalog read failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
