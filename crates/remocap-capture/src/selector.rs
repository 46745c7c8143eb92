//! 적응형 디코딩 변형 선택기.
//!
//! 마지막으로 성공한 정규화 변형을 먼저 시도한다. 모든 변형이 실패하면
//! 순서를 설정 기본값으로 되돌리고 `CoreError::Decode`를 반환한다.

use image::DynamicImage;
use parking_lot::Mutex;
use remocap_core::error::CoreError;
use remocap_core::ports::decoder::ImageDecoder;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::normalizer::DecodeVariant;

/// 이 길이 미만의 응답은 이미지가 아니라 전송 계층 에러 메시지일 가능성이 높다
pub const SUSPICIOUS_PAYLOAD_LEN: usize = 100;

/// 변형 시도 순서
///
/// 항상 설정된 변형 집합의 순열이다 (중복/누락 없음).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOrder {
    default: Vec<DecodeVariant>,
    current: Vec<DecodeVariant>,
}

impl VariantOrder {
    /// 기본 순서 지정 생성: 비어 있거나 중복이 있으면 설정 에러
    pub fn new(default: Vec<DecodeVariant>) -> Result<Self, CoreError> {
        if default.is_empty() {
            return Err(CoreError::Config("디코딩 변형 순서가 비어 있음".to_string()));
        }
        let unique: HashSet<_> = default.iter().collect();
        if unique.len() != default.len() {
            return Err(CoreError::Config(format!(
                "디코딩 변형 순서에 중복 있음: {default:?}"
            )));
        }
        Ok(Self {
            current: default.clone(),
            default,
        })
    }

    /// 현재 시도 순서
    pub fn current(&self) -> &[DecodeVariant] {
        &self.current
    }

    /// 설정 기본 순서
    pub fn default_order(&self) -> &[DecodeVariant] {
        &self.default
    }

    /// 성공한 변형을 맨 앞으로 (나머지 상대 순서 유지)
    pub fn promote(&mut self, winner: DecodeVariant) {
        if let Some(pos) = self.current.iter().position(|v| *v == winner) {
            let v = self.current.remove(pos);
            self.current.insert(0, v);
        }
    }

    /// 기본 순서로 복원
    pub fn reset(&mut self) {
        self.current.clone_from(&self.default);
    }
}

impl Default for VariantOrder {
    fn default() -> Self {
        Self {
            default: DecodeVariant::ALL.to_vec(),
            current: DecodeVariant::ALL.to_vec(),
        }
    }
}

/// 적응형 디코딩 선택기
pub struct AdaptiveDecodeSelector {
    decoder: Arc<dyn ImageDecoder>,
    order: Mutex<VariantOrder>,
}

impl AdaptiveDecodeSelector {
    /// 기본 순서(0, 1, 2)로 생성
    pub fn new(decoder: Arc<dyn ImageDecoder>) -> Self {
        Self::with_order(decoder, VariantOrder::default())
    }

    /// 순서 지정 생성
    pub fn with_order(decoder: Arc<dyn ImageDecoder>, order: VariantOrder) -> Self {
        Self {
            decoder,
            order: Mutex::new(order),
        }
    }

    /// 현재 시도 순서 스냅샷
    pub fn order(&self) -> Vec<DecodeVariant> {
        self.order.lock().current().to_vec()
    }

    /// 원시 캡처 디코딩.
    ///
    /// 성공 시 이미지와 이긴 변형을 반환하고 그 변형을 맨 앞으로 옮긴다.
    /// 디코딩 중에는 순서 락을 잡지 않는다.
    pub fn decode(&self, raw: &[u8]) -> Result<(DynamicImage, DecodeVariant), CoreError> {
        let attempts = self.order();
        let mut last_error = None;

        for variant in attempts {
            let bytes = variant.normalize(raw);
            match self.decoder.decode(&bytes) {
                Ok(image) => {
                    self.order.lock().promote(variant);
                    debug!("스크린샷 디코딩 성공: 변형 {variant}");
                    return Ok((image, variant));
                }
                Err(e) => {
                    debug!("변형 {variant} 디코딩 실패: {e}");
                    last_error = Some(e);
                }
            }
        }

        self.order.lock().reset();
        if raw.len() < SUSPICIOUS_PAYLOAD_LEN {
            warn!(
                "예상치 못한 스크린샷 응답 ({} bytes): {:?}",
                raw.len(),
                String::from_utf8_lossy(raw)
            );
        }

        let detail = last_error.map(|e| e.to_string()).unwrap_or_default();
        Err(CoreError::Decode(format!(
            "스크린샷 로드 불가 ({} bytes): {detail}",
            raw.len()
        )))
    }
}
