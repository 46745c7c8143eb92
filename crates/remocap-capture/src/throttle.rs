//! 캡처 주기 쓰로틀.
//!
//! 연속 캡처 사이에 최소 간격을 강제해 원격 링크 과부하를 막는다.
//! 대기는 종료 신호(`watch::Receiver<bool>`)로 중단할 수 있다.

use parking_lot::Mutex;
use remocap_core::config::{MAX_CAPTURE_INTERVAL_SECS, MIN_CAPTURE_INTERVAL_SECS};
use remocap_core::error::CoreError;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::info;

/// 쓰로틀 상태
#[derive(Debug)]
struct ThrottleState {
    /// 최소 간격
    interval: Duration,
    /// 마지막 reset 시각 (None이면 첫 wait는 즉시 반환)
    last_reset: Option<Instant>,
}

/// 캡처 주기 쓰로틀
#[derive(Debug)]
pub struct IntervalThrottle {
    state: Mutex<ThrottleState>,
}

impl IntervalThrottle {
    /// 새 쓰로틀 생성 (간격은 0.1 ~ 1.0초로 클램프)
    pub fn new(interval_secs: f64) -> Self {
        Self {
            state: Mutex::new(ThrottleState {
                interval: clamp_interval(interval_secs),
                last_reset: None,
            }),
        }
    }

    /// 현재 간격
    pub fn interval(&self) -> Duration {
        self.state.lock().interval
    }

    /// 간격 변경. 클램프된 값이 현재와 다를 때만 로그 후 적용한다.
    ///
    /// 적용된(또는 유지된) 간격을 반환.
    pub fn set_interval(&self, interval_secs: f64) -> Duration {
        let interval = clamp_interval(interval_secs);
        let mut state = self.state.lock();
        if interval != state.interval {
            info!("스크린샷 간격 변경: {:.3}s", interval.as_secs_f64());
            state.interval = interval;
        }
        state.interval
    }

    /// 현재 시각을 새 기준점으로 기록
    pub fn reset(&self) {
        self.state.lock().last_reset = Some(Instant::now());
    }

    /// 마지막 reset 이후 간격이 지날 때까지 대기
    pub async fn wait(&self, shutdown: &mut watch::Receiver<bool>) -> Result<(), CoreError> {
        let deadline = {
            let state = self.state.lock();
            match state.last_reset {
                Some(last) => last + state.interval,
                None => return Ok(()),
            }
        };
        sleep_until_or_shutdown(deadline, shutdown).await
    }
}

impl Default for IntervalThrottle {
    fn default() -> Self {
        Self::new(MIN_CAPTURE_INTERVAL_SECS)
    }
}

/// 간격 클램프 [0.1, 1.0]초. NaN은 하한으로 취급
pub fn clamp_interval(interval_secs: f64) -> Duration {
    let secs = if interval_secs.is_nan() {
        MIN_CAPTURE_INTERVAL_SECS
    } else {
        interval_secs.clamp(MIN_CAPTURE_INTERVAL_SECS, MAX_CAPTURE_INTERVAL_SECS)
    };
    Duration::from_secs_f64(secs)
}

/// `delay` 동안 대기하되 종료 신호가 오면 `CoreError::Cancelled`
pub async fn sleep_or_shutdown(
    delay: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), CoreError> {
    sleep_until_or_shutdown(Instant::now() + delay, shutdown).await
}

/// `deadline`까지 대기하되 종료 신호가 오면 `CoreError::Cancelled`
pub async fn sleep_until_or_shutdown(
    deadline: Instant,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<(), CoreError> {
    if *shutdown.borrow() {
        return Err(CoreError::Cancelled);
    }
    if deadline <= Instant::now() {
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return Ok(()),
            changed = shutdown.changed() => {
                if changed.is_err() {
                    // 송신자 없음 → 종료 신호가 올 수 없으므로 남은 시간만 대기
                    tokio::time::sleep_until(deadline).await;
                    return Ok(());
                }
                if *shutdown.borrow() {
                    return Err(CoreError::Cancelled);
                }
            }
        }
    }
}
