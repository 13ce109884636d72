//! Exponential-backoff retry around transport operations.

use crate::error::{Error, Result};

use rand::Rng;
use std::{sync, time};

/// Observation hook fired before each retry sleep with the upcoming attempt
/// number, the error that triggered it, and the chosen delay. Purely
/// informational.
pub type RetryObserver = dyn Fn(u32, &Error, time::Duration) + Send + Sync;

/// Backoff configuration.
///
/// Constructed once, immutable, reused across calls.
///
/// ```rust
/// use dynamodb_intent::retry;
/// use std::time;
///
/// let policy = retry::RetryPolicy {
///     max_retries: 5,
///     ..Default::default()
/// };
/// assert_eq!(policy.base_delay, time::Duration::from_millis(100));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Base delay for the exponential schedule.
    pub base_delay: time::Duration,
    /// Fraction of the exponential delay added as random jitter.
    pub jitter_factor: f64,
    /// Ceiling on any single delay, including server hints.
    pub max_delay: time::Duration,
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: time::Duration::from_millis(100),
            jitter_factor: 0.5,
            max_delay: time::Duration::from_secs(20),
            max_retries: 3,
        }
    }
}

/// Wraps asynchronous operations with classified, jittered retry.
///
/// Attempts within one `execute` call are strictly sequential; independent
/// calls share nothing and interleave freely.
pub struct RetryExecutor {
    observer: Option<sync::Arc<RetryObserver>>,
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Executor with the given policy and no observer.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            observer: None,
            policy,
        }
    }

    /// Attach an observation hook. It has no effect on control flow.
    pub fn with_observer(mut self, observer: sync::Arc<RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// The configured policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation`, retrying transient failures per policy.
    ///
    /// Fatal errors propagate immediately with zero retries. Once the retry
    /// budget is spent, the last error is re-raised unmodified.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(output) => return Ok(output),
                Err(error) if error.is_retryable() && attempt < self.policy.max_retries => {
                    let delay = self.delay_for(attempt, &error);
                    attempt += 1;
                    if let Some(observer) = &self.observer {
                        observer(attempt, &error, delay);
                    }
                    tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Delay before retry number `attempt + 1`.
    ///
    /// A server hint wins, capped at the policy maximum; otherwise full
    /// exponential backoff with proportional random jitter, capped the same
    /// way.
    fn delay_for(&self, attempt: u32, error: &Error) -> time::Duration {
        if let Some(hint) = error.retry_after() {
            return hint.min(self.policy.max_delay);
        }
        let exponential = self
            .policy
            .base_delay
            .saturating_mul(1_u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let jitter = exponential.as_secs_f64()
            * self.policy.jitter_factor
            * rand::rng().random_range(0.0..1.0);
        exponential
            .saturating_add(time::Duration::from_secs_f64(jitter))
            .min(self.policy.max_delay)
    }
}
