//! Startup retry policy
//!
//! Bounded attempts with a fixed delay between them. Only the initial bind
//! runs under this policy; health-driven recovery is single-shot.

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::error::{GatewayError, Result};

/// Fixed-delay retry policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    /// Wait between a failed attempt and the next one
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `attempt_fn` until it succeeds or attempts run out
    ///
    /// On exhaustion the last failure is wrapped in
    /// [`GatewayError::RetryExhausted`].
    pub async fn run<F, Fut, T>(&self, mut attempt_fn: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            if attempt > 1 {
                info!("Waiting {:?} before bind attempt {}", self.delay, attempt);
                tokio::time::sleep(self.delay).await;
            }

            let start_time = Instant::now();
            match attempt_fn().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(
                            "Bind succeeded on attempt {}/{} after {:?}",
                            attempt,
                            max_attempts,
                            start_time.elapsed()
                        );
                    }
                    return Ok(value);
                },
                Err(e) if attempt < max_attempts => {
                    warn!("Bind attempt {}/{} failed: {}", attempt, max_attempts, e);
                },
                Err(e) => {
                    warn!("Bind attempt {}/{} failed: {}", attempt, max_attempts, e);
                    return Err(GatewayError::RetryExhausted {
                        attempts: attempt,
                        last: Box::new(e),
                    });
                },
            }
        }
    }
}
