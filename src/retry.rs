//! Bounded retry with linear backoff
//!
//! Wraps any fallible async operation. The policy is constructed and
//! injected explicitly; it holds no state across invocations.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, warn};

use crate::Result;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_INCREMENT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff_increment: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_increment: Duration) -> Self {
        Self {
            max_retries,
            backoff_increment,
        }
    }

    /// Run `operation` up to `max_retries + 1` times. After the n-th
    /// failure the wait is `backoff_increment * n` (linear, not
    /// exponential). The last error is propagated once attempts are
    /// exhausted; success returns immediately.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt < self.max_retries {
                        let delay = self.backoff_increment * (attempt + 1);
                        warn!(
                            attempt = attempt + 1,
                            attempts_total = self.max_retries + 1,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Attempt failed, retrying"
                        );
                        sleep(delay).await;
                        attempt += 1;
                    } else {
                        error!(
                            max_retries = self.max_retries,
                            error = %err,
                            "Max retries exceeded"
                        );
                        return Err(err);
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BACKOFF_INCREMENT)
    }
}
