//! 캡처 포트.
//!
//! 구현: `remocap-capture` crate (adb, aScreenCap, uiautomator2)

use async_trait::async_trait;

use crate::config::CaptureMethod;
use crate::error::CoreError;
use crate::models::frame::CaptureOutput;

/// 디바이스 셸: 명령을 실행하고 stdout 바이트를 그대로 반환
#[async_trait]
pub trait DeviceShell: Send + Sync {
    /// 디바이스에서 셸 명령 실행.
    ///
    /// 실패(연결 끊김, 비정상 종료 등)는 `CoreError::Transport`로 반환한다.
    async fn shell(&self, args: &[&str]) -> Result<Vec<u8>, CoreError>;
}

/// 캡처 백엔드: 원격 화면 한 프레임 획득
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// 백엔드 종류
    fn method(&self) -> CaptureMethod;

    /// 한 프레임 캡처.
    ///
    /// 원시 바이트(`CaptureOutput::Raw`)는 세션이 디코딩하고,
    /// `CaptureOutput::Decoded`는 그대로 사용된다.
    async fn capture(&self) -> Result<CaptureOutput, CoreError>;
}
