//! 재시도 실행기.
//!
//! 실패할 수 있는 캡처 연산을 고정 횟수/고정 간격으로 재시도한다.
//! 시도별 실패는 debug 로그만 남기고, 한도 초과 시 마지막 에러를 그대로 반환한다.

use remocap_core::error::CoreError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::throttle::sleep_or_shutdown;

/// 기본 시도 횟수
pub const DEFAULT_TRIES: u32 = 10;

/// 기본 시도 간 대기
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// 재시도 실행기
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    tries: u32,
    delay: Duration,
    shutdown: watch::Receiver<bool>,
}

impl RetryExecutor {
    /// 새 실행기 생성 (최소 1회 시도)
    pub fn new(tries: u32, delay: Duration) -> Self {
        Self {
            tries: tries.max(1),
            delay,
            shutdown: watch::channel(false).1,
        }
    }

    /// 종료 신호 연결: 시도 간 대기가 중단된다
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// 최대 시도 횟수
    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// 시도 간 대기
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 연산 실행.
    ///
    /// 재시도 불가 에러(`Config`, `Cancelled`)는 즉시 반환한다.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut shutdown = self.shutdown.clone();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("재시도 성공 (시도 {attempt}/{})", self.tries);
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => return Err(e),
                Err(e) if attempt >= self.tries => {
                    warn!("재시도 한도 초과 ({} 회): {e}", self.tries);
                    return Err(e);
                }
                Err(e) => {
                    debug!(
                        "시도 실패 ({attempt}/{}): {e}, {:?} 후 재시도",
                        self.tries, self.delay
                    );
                    sleep_or_shutdown(self.delay, &mut shutdown).await?;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_TRIES, DEFAULT_DELAY)
    }
}
