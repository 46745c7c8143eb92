//! 이미지 디코더 포트.

use image::DynamicImage;

use crate::error::CoreError;

/// 바이트 → 이미지 디코더
///
/// 순수 함수로 취급되며 공유 상태를 건드리지 않는다.
pub trait ImageDecoder: Send + Sync {
    /// 바이트 디코딩. 잘못된 입력은 `CoreError::Decode`.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CoreError>;
}
