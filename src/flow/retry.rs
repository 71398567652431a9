use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::error::Result;

/// 重试策略
///
/// `max_attempts` counts every call, the first one included, so `1` means
/// "no retry". The wait is fixed and only happens between attempts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub wait: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            wait,
        }
    }

    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Runs `attempt` until it succeeds or the attempts run out, returning
    /// the last error in the latter case.
    pub async fn run<T, F, Fut>(&self, label: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut current = 1;
        loop {
            match attempt(current).await {
                Ok(value) => return Ok(value),
                Err(error) if current < max_attempts => {
                    warn!(
                        node = label,
                        attempt = current,
                        max_attempts,
                        error = %error,
                        "attempt failed, retrying"
                    );
                    if !self.wait.is_zero() {
                        sleep(self.wait).await;
                    }
                    current += 1;
                }
                Err(error) => {
                    if max_attempts > 1 {
                        warn!(node = label, attempts = max_attempts, error = %error, "retries exhausted");
                    }
                    return Err(error);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn stops_after_first_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let value = policy
            .run("flaky", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(FlowError::Llm("busy".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_when_exhausted() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(1));
        let err = policy
            .run::<(), _, _>("broken", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(FlowError::Llm(format!("attempt {attempt}"))) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(err.to_string(), "llm error: attempt 2");
    }

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
