//! 캡처 백엔드 어댑터.
//!
//! `CaptureMethod`에 따라 세션 생성 시 한 번 선택된다.

pub mod adb;
pub mod ascreencap;
pub mod shell;
pub mod uiautomator2;

use remocap_core::config::{AppConfig, CaptureMethod};
use remocap_core::error::CoreError;
use remocap_core::ports::capture::{CaptureBackend, DeviceShell};
use remocap_core::ports::decoder::ImageDecoder;
use std::sync::Arc;
use tracing::info;

pub use adb::AdbBackend;
pub use ascreencap::AScreenCapBackend;
pub use shell::AdbShell;
pub use uiautomator2::Uiautomator2Backend;

/// 설정에 맞는 백엔드 생성.
///
/// 셸 기반 백엔드는 `shell`을 공유하고, 자체 디코딩하는 백엔드(uiautomator2)는
/// 세션과 같은 `decoder`를 쓴다.
pub fn create_backend(
    config: &AppConfig,
    shell: Arc<dyn DeviceShell>,
    decoder: Arc<dyn ImageDecoder>,
) -> Result<Box<dyn CaptureBackend>, CoreError> {
    let method = config.capture.method;
    let backend: Box<dyn CaptureBackend> = match method {
        CaptureMethod::Adb => Box::new(AdbBackend::new(shell)),
        CaptureMethod::AScreenCap => Box::new(AScreenCapBackend::new(
            shell,
            config.device.ascreencap_path.clone(),
        )),
        CaptureMethod::Uiautomator2 => Box::new(Uiautomator2Backend::new(
            &config.device.uiautomator2_url,
            config.transport_timeout(),
            decoder,
        )?),
    };
    info!("캡처 백엔드: {method}");
    Ok(backend)
}
