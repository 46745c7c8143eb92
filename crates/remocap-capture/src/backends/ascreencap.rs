//! aScreenCap 백엔드.
//!
//! 디바이스의 aScreenCap 바이너리를 `--pack 2 --stdout`으로 실행한다.
//! 출력은 LZ4 블록이며 앞 4바이트는 원본 길이(little-endian u32).

use async_trait::async_trait;
use remocap_core::config::CaptureMethod;
use remocap_core::error::CoreError;
use remocap_core::models::frame::CaptureOutput;
use remocap_core::ports::capture::{CaptureBackend, DeviceShell};
use std::sync::Arc;
use tracing::debug;

/// aScreenCap 백엔드
pub struct AScreenCapBackend {
    shell: Arc<dyn DeviceShell>,
    binary: String,
}

impl AScreenCapBackend {
    /// 새 백엔드 생성 (`binary`: 디바이스 내 aScreenCap 경로)
    pub fn new(shell: Arc<dyn DeviceShell>, binary: impl Into<String>) -> Self {
        Self {
            shell,
            binary: binary.into(),
        }
    }
}

/// 길이 접두 LZ4 블록 해제
pub fn decompress(packed: &[u8]) -> Result<Vec<u8>, CoreError> {
    lz4_flex::block::decompress_size_prepended(packed)
        .map_err(|e| CoreError::Decode(format!("aScreenCap LZ4 해제 실패: {e}")))
}

#[async_trait]
impl CaptureBackend for AScreenCapBackend {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::AScreenCap
    }

    async fn capture(&self) -> Result<CaptureOutput, CoreError> {
        let packed = self
            .shell
            .shell(&[self.binary.as_str(), "--pack", "2", "--stdout"])
            .await?;
        let raw = decompress(&packed)?;
        debug!("aScreenCap: {}bytes → {}bytes", packed.len(), raw.len());
        Ok(CaptureOutput::Raw(raw))
    }
}
