//! 진단용 링 버퍼.
//!
//! 최근 스크린샷을 고정 용량으로 보존한다. 용량 초과 시 가장 오래된 항목부터 제거.
//! 용량은 생성 시 고정되며, 바꾸려면 버퍼를 새로 만든다.

use remocap_core::models::frame::DiagnosticEntry;
use std::collections::VecDeque;

/// 고정 용량 FIFO
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

/// 진단 스크린샷 링 버퍼
pub type DiagnosticRingBuffer = RingBuffer<DiagnosticEntry>;

impl<T> RingBuffer<T> {
    /// 새 버퍼 생성
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// 항목 추가. 용량 초과 시 가장 오래된 항목을 제거해 반환
    pub fn push(&mut self, entry: T) -> Option<T> {
        self.entries.push_back(entry);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// 전체 항목 수
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 비어있는지
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Clone> RingBuffer<T> {
    /// 오래된 순 스냅샷
    pub fn snapshot(&self) -> Vec<T> {
        self.entries.iter().cloned().collect()
    }
}
