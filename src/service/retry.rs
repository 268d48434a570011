use std::future::Future;
use std::time::Duration;

use crate::vision::TransportError;

/// 재시도 정책: 최대 `max_retries`회 추가 시도, 지연 = base × 2^attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// 전체 시도 횟수 (첫 시도 포함)
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// attempt(0부터)번째 실패 후 대기 시간
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// 재시도 가능한 실패는 backoff 후 다시 시도, 그 외 실패는 즉시 반환
    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, TransportError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "Request failed (attempt {}/{}): {}, retrying in {:?}",
                        attempt + 1,
                        self.max_attempts(),
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn delay_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
        assert_eq!(policy.max_attempts(), 3);
    }

    #[tokio::test]
    async fn persistent_rate_limit_uses_every_attempt() {
        for max_retries in 0..4u32 {
            let policy = RetryPolicy::new(max_retries, Duration::ZERO);
            let counter = AtomicU32::new(0);
            let calls = &counter;

            let result: Result<(), _> = policy
                .run(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TransportError::RateLimited("busy".into()))
                })
                .await;

            assert!(matches!(result, Err(TransportError::RateLimited(_))));
            assert_eq!(calls.load(Ordering::SeqCst), max_retries + 1);
        }
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = policy
            .run(move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(TransportError::Connection("reset".into()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_retryable_error_stops_immediately() {
        let policy = RetryPolicy::new(5, Duration::ZERO);
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), _> = policy
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TransportError::Api {
                    status: 400,
                    message: "bad request".into(),
                })
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_with_exponential_backoff() {
        let policy = RetryPolicy::default();
        let start = tokio::time::Instant::now();

        let result: Result<(), _> = policy
            .run(|| async { Err(TransportError::Connection("down".into())) })
            .await;

        assert!(result.is_err());
        // 1s + 2s
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
    }
}
