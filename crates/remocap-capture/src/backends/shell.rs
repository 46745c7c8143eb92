//! adb 기반 디바이스 셸.
//!
//! `DeviceShell` 포트 구현. `adb [-s serial] shell <args>`를 실행하고 stdout을 그대로 반환한다.

use async_trait::async_trait;
use remocap_core::config::AppConfig;
use remocap_core::error::CoreError;
use remocap_core::ports::capture::DeviceShell;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// adb 셸: `DeviceShell` 포트 구현
#[derive(Debug, Clone)]
pub struct AdbShell {
    adb_path: PathBuf,
    serial: Option<String>,
    timeout: Duration,
}

impl AdbShell {
    /// 새 셸 생성
    pub fn new(adb_path: impl Into<PathBuf>, serial: Option<String>, timeout: Duration) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial,
            timeout,
        }
    }

    /// 설정에서 생성
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.device.adb_path.clone(),
            config.device.serial.clone(),
            config.transport_timeout(),
        )
    }

    /// adb 인자 목록 (`-s serial shell ...`)
    pub fn command_args<'a>(&'a self, args: &[&'a str]) -> Vec<&'a str> {
        let mut full = Vec::with_capacity(args.len() + 3);
        if let Some(serial) = self.serial.as_deref() {
            full.extend(["-s", serial]);
        }
        full.push("shell");
        full.extend_from_slice(args);
        full
    }
}

#[async_trait]
impl DeviceShell for AdbShell {
    async fn shell(&self, args: &[&str]) -> Result<Vec<u8>, CoreError> {
        let full = self.command_args(args);
        debug!("adb {}", full.join(" "));

        let child = Command::new(&self.adb_path)
            .args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                CoreError::Transport(format!("adb 실행 실패 {}: {e}", self.adb_path.display()))
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CoreError::Transport(format!("adb 응답 타임아웃 ({:?})", self.timeout)))?
            .map_err(|e| CoreError::Transport(format!("adb 출력 읽기 실패: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CoreError::Transport(format!(
                "adb 비정상 종료 ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}
