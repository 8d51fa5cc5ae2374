// Bounded exponential backoff: stops on success, on a non-retryable error,
// at max_attempts, or once max_elapsed has passed, whichever comes first.

use rand::Rng;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Errors opt into retrying by reporting themselves as transient.
pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first one.
    pub max_attempts: u32,
    /// Wall-clock budget measured from the first call.
    pub max_elapsed: Duration,
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Option<Duration>,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            max_elapsed: Duration::from_secs(120),
            initial_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: None,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based), before jitter.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.multiplier.powi(retry.min(i32::MAX as u32) as i32);
        let secs = self.initial_delay.as_secs_f64() * factor;
        let delay = Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX);

        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    fn next_delay(&self, retry: u32) -> Duration {
        let delay = self.delay_for(retry);
        if self.jitter {
            // full jitter: uniform in [0, delay]
            let factor: f64 = rand::thread_rng().gen_range(0.0..=1.0);
            Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(delay)
        } else {
            delay
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUp {
    MaxAttempts,
    MaxElapsed,
    NotRetryable,
}

#[derive(Debug)]
pub struct RetryError<E> {
    pub attempts: u32,
    pub elapsed: Duration,
    pub reason: GiveUp,
    pub last_error: E,
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let why = match self.reason {
            GiveUp::MaxAttempts => "attempt limit reached",
            GiveUp::MaxElapsed => "time budget exhausted",
            GiveUp::NotRetryable => "non-retryable error",
        };
        write!(f, "{} after {:?}: {}", why, self.elapsed, self.last_error)
    }
}

/// Run `operation` until it succeeds or `policy` gives up.
///
/// The closure receives the 1-based attempt number. The last wait is
/// shortened to whatever budget remains, so one final attempt starts at the
/// deadline. Attempts are never cut short here; the operation bounds its own
/// duration.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + fmt::Display,
{
    let started = Instant::now();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempts = attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        let elapsed = started.elapsed();

        if !error.is_retryable() {
            tracing::error!(error = %error, "Operation failed with non-retryable error");
            return Err(RetryError {
                attempts: attempt,
                elapsed,
                reason: GiveUp::NotRetryable,
                last_error: error,
            });
        }

        if attempt >= policy.max_attempts {
            tracing::error!(
                error = %error,
                attempts = attempt,
                "Operation failed after all retry attempts exhausted"
            );
            return Err(RetryError {
                attempts: attempt,
                elapsed,
                reason: GiveUp::MaxAttempts,
                last_error: error,
            });
        }

        if elapsed >= policy.max_elapsed {
            tracing::error!(
                error = %error,
                attempts = attempt,
                elapsed_ms = elapsed.as_millis() as u64,
                "Operation failed, retry budget exhausted"
            );
            return Err(RetryError {
                attempts: attempt,
                elapsed,
                reason: GiveUp::MaxElapsed,
                last_error: error,
            });
        }

        // 最後一次等待不超過剩餘預算
        let delay = policy
            .next_delay(attempt - 1)
            .min(policy.max_elapsed - elapsed);

        tracing::warn!(
            error = %error,
            attempt = attempt,
            max_attempts = policy.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Operation failed, retrying"
        );

        tokio::time::sleep(delay).await;
    }
}
