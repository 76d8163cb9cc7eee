//! Bounded exponential backoff for transient backend errors.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use guichet_core::config::AnswerConfig;
use guichet_core::error::{GuichetError, Result};

/// Retry schedule for embedder/backend calls. `InvalidArgument` and other
/// non-transient errors pass through untouched on the first occurrence.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(base_delay_ms),
        }
    }

    pub fn from_config(cfg: &AnswerConfig) -> Self {
        Self::new(cfg.max_retries, cfg.retry_base_delay_ms)
    }

    /// Run `op`, retrying transient failures up to `max_retries` times with
    /// exponentially growing, jittered delays. Exhaustion collapses into
    /// `BackendUnavailable` carrying the last error.
    pub async fn run<T, Fut>(&self, what: &str, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        call = what,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient backend error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) if e.is_transient() => {
                    return Err(GuichetError::BackendUnavailable(format!(
                        "{what} still failing after {} attempts: {e}",
                        attempt + 1
                    )));
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Delay before retry number `attempt + 1`: base × 2^attempt plus up to
    /// 25% random jitter to keep concurrent workers from retrying in step.
    fn delay_for(&self, attempt: u32) -> Duration {
        let backoff = self.base_delay.saturating_mul(1u32 << attempt.min(16));
        let jitter_max = backoff.as_millis() as u64 / 4;
        let jitter = rand::thread_rng().gen_range(0..=jitter_max);
        backoff + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::new(2, 1)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let out: Result<&str> = fast()
            .run("generation", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(GuichetError::RateLimited("429".into()))
                    } else {
                        Ok("ça marche")
                    }
                }
            })
            .await;
        assert_eq!(out.unwrap(), "ça marche");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_becomes_backend_unavailable() {
        let calls = AtomicU32::new(0);
        let out: Result<()> = fast()
            .run("embedding", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GuichetError::EmbeddingFailure("boom".into())) }
            })
            .await;
        assert!(matches!(out, Err(GuichetError::BackendUnavailable(_))));
        // 1 initial + 2 retries
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_never_retry() {
        let calls = AtomicU32::new(0);
        let out: Result<()> = fast()
            .run("generation", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(GuichetError::InvalidArgument("vide".into())) }
            })
            .await;
        assert!(matches!(out, Err(GuichetError::InvalidArgument(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn delays_grow_exponentially() {
        let policy = RetryPolicy::new(3, 100);
        let d0 = policy.delay_for(0);
        let d2 = policy.delay_for(2);
        assert!(d0 >= Duration::from_millis(100));
        assert!(d0 <= Duration::from_millis(125));
        assert!(d2 >= Duration::from_millis(400));
        assert!(d2 <= Duration::from_millis(500));
    }
}
