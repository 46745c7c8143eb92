//! 이미지 코덱 어댑터.
//!
//! `ImageDecoder` 포트 구현 (image crate). 모든 프레임은 RGB8로 통일한다.

use image::{DynamicImage, ImageFormat};
use remocap_core::error::CoreError;
use remocap_core::ports::decoder::ImageDecoder;
use std::io::Cursor;

/// image crate 기반 디코더: 포맷은 매직 바이트로 추정
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateDecoder;

impl ImageCrateDecoder {
    /// 새 디코더 생성
    pub fn new() -> Self {
        Self
    }
}

impl ImageDecoder for ImageCrateDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, CoreError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| CoreError::Decode(format!("이미지 디코딩 실패 ({} bytes): {e}", bytes.len())))?;
        Ok(to_rgb(image))
    }
}

/// RGB8로 변환
pub fn to_rgb(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// PNG 인코딩
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, CoreError> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageFormat::Png)?;
    Ok(buf.into_inner())
}
