//! adb `screencap` 백엔드.

use async_trait::async_trait;
use remocap_core::config::CaptureMethod;
use remocap_core::error::CoreError;
use remocap_core::models::frame::CaptureOutput;
use remocap_core::ports::capture::{CaptureBackend, DeviceShell};
use std::sync::Arc;

/// 셸 명령: PNG를 stdout으로
const SCREENCAP_ARGS: &[&str] = &["screencap", "-p"];

/// adb 백엔드: 원시 PNG 바이트 반환 (전송 계층 변형 가능)
pub struct AdbBackend {
    shell: Arc<dyn DeviceShell>,
}

impl AdbBackend {
    /// 새 백엔드 생성
    pub fn new(shell: Arc<dyn DeviceShell>) -> Self {
        Self { shell }
    }
}

#[async_trait]
impl CaptureBackend for AdbBackend {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::Adb
    }

    async fn capture(&self) -> Result<CaptureOutput, CoreError> {
        let bytes = self.shell.shell(SCREENCAP_ARGS).await?;
        Ok(CaptureOutput::Raw(bytes))
    }
}
