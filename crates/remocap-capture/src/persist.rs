//! 스크린샷 파일 저장.

use chrono::{DateTime, Utc};
use image::DynamicImage;
use remocap_core::error::CoreError;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

use crate::codec::encode_png;

/// 파일명: 캡처 시각의 Unix epoch 밀리초
pub(crate) fn file_name(captured_at: DateTime<Utc>) -> String {
    format!("{}.png", captured_at.timestamp_millis())
}

/// `<dir>/<epoch_ms>.png`에 PNG로 저장하고 전체 경로를 반환
pub(crate) async fn write_png(
    dir: &Path,
    captured_at: DateTime<Utc>,
    image: Arc<DynamicImage>,
) -> Result<PathBuf, CoreError> {
    fs::create_dir_all(dir).await?;

    // PNG 인코딩은 CPU 작업
    let png = tokio::task::spawn_blocking(move || encode_png(&image))
        .await
        .map_err(|e| CoreError::Internal(format!("태스크 실패: {e}")))??;

    let path = dir.join(file_name(captured_at));
    fs::write(&path, &png).await?;

    debug!("스크린샷 저장: {} ({}bytes)", path.display(), png.len());
    Ok(path)
}
