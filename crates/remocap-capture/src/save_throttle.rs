//! 카테고리별 저장 쓰로틀.
//!
//! 카테고리마다 마지막 호출 시각을 기억하고, 간격이 지났을 때만 저장을 허용한다.
//! 거부된 호출도 마지막 시각을 갱신하므로 연속 호출 중에는 저장이 계속 미뤄진다.

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// 카테고리별 저장 쓰로틀
#[derive(Debug, Default)]
pub struct SaveThrottle {
    /// 카테고리 → 마지막 호출 시각 (지연 생성, 제거하지 않음)
    last_saved: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl SaveThrottle {
    /// 새 쓰로틀 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장 여부 판단.
    ///
    /// `now - last`가 `interval`보다 엄격히 클 때만 true. 결과와 무관하게 마지막 시각을 `now`로 갱신한다
    /// (단, 과거 시각으로 되돌리지는 않는다). 조회와 갱신은 하나의 임계 구역이다.
    pub fn should_save(&self, category: &str, now: DateTime<Utc>, interval: Duration) -> bool {
        let interval = TimeDelta::from_std(interval).unwrap_or(TimeDelta::MAX);
        let mut map = self.last_saved.lock();

        let last = map.get(category).copied().unwrap_or(DateTime::UNIX_EPOCH);
        let allowed = now.signed_duration_since(last) > interval;
        map.insert(category.to_string(), now.max(last));

        if !allowed {
            debug!("저장 쓰로틀: {category}");
        }
        allowed
    }

    /// 다음 호출이 반드시 허용되도록 마지막 시각을 초기화
    pub fn reset(&self, category: &str) {
        self.last_saved
            .lock()
            .insert(category.to_string(), DateTime::UNIX_EPOCH);
    }

    /// 마지막 호출 시각 조회
    pub fn last_saved(&self, category: &str) -> Option<DateTime<Utc>> {
        self.last_saved.lock().get(category).copied()
    }
}
