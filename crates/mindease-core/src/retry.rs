//! Bounded retry with a fixed pause between attempts.

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Waits between attempts. Injected so tests never sleep.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, delay: Duration);
}

/// Suspends only the calling task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// All attempts failed; carries the last failure.
#[derive(Error, Debug)]
#[error("{operation} gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted<E> {
    pub operation: &'static str,
    pub attempts: u32,
    pub last_error: E,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Run `op` until it succeeds or the budget is spent.
    ///
    /// `op` receives the 1-based attempt number. `pause` is awaited between attempts only,
    /// never after the last one.
    pub async fn run<T, E, F, Fut>(
        &self,
        pause: &dyn Pause,
        operation: &'static str,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        target: "mindease::retry",
                        operation,
                        attempt,
                        max_attempts = attempts,
                        "[Retry {}] {} failed: {}",
                        attempt,
                        operation,
                        e
                    );
                    if attempt >= attempts {
                        return Err(RetryExhausted {
                            operation,
                            attempts,
                            last_error: e,
                        });
                    }
                    pause.pause(self.delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
