//! 캡처 프레임 모델.
//!
//! 전송 계층 원시 출력, 디코딩된 스크린샷, 진단 링 버퍼 항목을 정의.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;

/// 캡처 백엔드 한 번의 출력
#[derive(Debug, Clone)]
pub enum CaptureOutput {
    /// 디코딩 전 원시 바이트 (전송 계층 변형 가능성 있음)
    Raw(Vec<u8>),
    /// 백엔드가 이미 디코딩한 이미지 (디코딩 단계 생략)
    Decoded(DynamicImage),
}

/// 디코딩 완료된 스크린샷
///
/// 이미지는 `Arc`로 공유되므로 호출자와 진단 버퍼가 각자 핸들을 가진다.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// RGB 이미지
    pub image: Arc<DynamicImage>,
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
}

impl DecodedImage {
    /// 새 스크린샷 생성 (현재 시각)
    pub fn new(image: DynamicImage) -> Self {
        Self::with_timestamp(image, Utc::now())
    }

    /// 캡처 시각 지정 생성
    pub fn with_timestamp(image: DynamicImage, captured_at: DateTime<Utc>) -> Self {
        Self {
            image: Arc::new(image),
            captured_at,
        }
    }

    /// 해상도 (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }
}

/// 진단 링 버퍼 항목
#[derive(Debug, Clone)]
pub struct DiagnosticEntry {
    /// 캡처 시각
    pub captured_at: DateTime<Utc>,
    /// 이미지 핸들
    pub image: Arc<DynamicImage>,
}

impl From<&DecodedImage> for DiagnosticEntry {
    fn from(decoded: &DecodedImage) -> Self {
        Self {
            captured_at: decoded.captured_at,
            image: Arc::clone(&decoded.image),
        }
    }
}
