//! 애플리케이션 설정 구조체.
//!
//! 디바이스 연결, 캡처 백엔드/주기/재시도, 진단 버퍼, 스크린샷 저장 경로 등
//! 런타임 설정을 정의한다. `ConfigManager`를 통해 JSON 파일에서 로드.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::CoreError;

/// 캡처 주기 하한 (초)
pub const MIN_CAPTURE_INTERVAL_SECS: f64 = 0.1;

/// 캡처 주기 상한 (초)
pub const MAX_CAPTURE_INTERVAL_SECS: f64 = 1.0;

/// 최상위 애플리케이션 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 디바이스 연결 설정
    #[serde(default)]
    pub device: DeviceConfig,
    /// 캡처 설정
    #[serde(default)]
    pub capture: CaptureConfig,
    /// 에러 진단 설정
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    /// 스크린샷 저장 설정
    #[serde(default)]
    pub save: SaveConfig,
}

// ============================================================
// 캡처 백엔드
// ============================================================

/// 캡처 백엔드: 세션 생성 시 한 번 선택된다
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMethod {
    /// `adb shell screencap -p` (PNG, 줄바꿈 변형 가능)
    #[default]
    Adb,
    /// aScreenCap 바이너리 (LZ4 압축 스트림)
    AScreenCap,
    /// uiautomator2 HTTP 스크린샷 (디코딩된 이미지)
    Uiautomator2,
}

impl CaptureMethod {
    /// 설정 문자열 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureMethod::Adb => "adb",
            CaptureMethod::AScreenCap => "ascreencap",
            CaptureMethod::Uiautomator2 => "uiautomator2",
        }
    }
}

impl fmt::Display for CaptureMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaptureMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adb" => Ok(CaptureMethod::Adb),
            "ascreencap" => Ok(CaptureMethod::AScreenCap),
            "uiautomator2" => Ok(CaptureMethod::Uiautomator2),
            other => Err(CoreError::Config(format!("알 수 없는 캡처 백엔드: {other}"))),
        }
    }
}

// ============================================================
// 디바이스/캡처/진단/저장 설정
// ============================================================

/// 디바이스 연결 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// adb 실행 파일 경로
    #[serde(default = "default_adb_path")]
    pub adb_path: PathBuf,
    /// 디바이스 시리얼 (예: "127.0.0.1:5555"). None이면 단일 디바이스 가정
    #[serde(default)]
    pub serial: Option<String>,
    /// 디바이스 내 aScreenCap 바이너리 경로
    #[serde(default = "default_ascreencap_path")]
    pub ascreencap_path: String,
    /// uiautomator2 (atx-agent) HTTP 주소
    #[serde(default = "default_uiautomator2_url")]
    pub uiautomator2_url: String,
    /// 전송 요청 타임아웃 (밀리초)
    #[serde(default = "default_transport_timeout_ms")]
    pub transport_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            adb_path: default_adb_path(),
            serial: None,
            ascreencap_path: default_ascreencap_path(),
            uiautomator2_url: default_uiautomator2_url(),
            transport_timeout_ms: default_transport_timeout_ms(),
        }
    }
}

/// 캡처 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// 캡처 백엔드
    #[serde(default)]
    pub method: CaptureMethod,
    /// 캡처 최소 간격 (초, 0.1 ~ 1.0으로 클램프)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
    /// 캡처+디코딩 최대 시도 횟수
    #[serde(default = "default_retry_tries")]
    pub retry_tries: u32,
    /// 시도 간 고정 대기 (밀리초)
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            method: CaptureMethod::default(),
            interval_secs: default_interval_secs(),
            retry_tries: default_retry_tries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// 에러 진단 설정: 최근 스크린샷 보존
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// 캡처마다 진단 링 버퍼에 보존할지 여부
    #[serde(default)]
    pub save_error: bool,
    /// 진단 링 버퍼 용량 (장)
    #[serde(default = "default_screenshot_length")]
    pub screenshot_length: usize,
    /// 진단 덤프 폴더
    #[serde(default = "default_error_folder")]
    pub error_folder: PathBuf,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            save_error: false,
            screenshot_length: default_screenshot_length(),
            error_folder: default_error_folder(),
        }
    }
}

/// 스크린샷 저장 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveConfig {
    /// 카테고리별 기본 저장 간격 (초)
    #[serde(default = "default_save_interval_secs")]
    pub interval_secs: f64,
    /// 일반 저장 폴더
    #[serde(default = "default_save_folder")]
    pub folder: PathBuf,
    /// 기본(base) 저장 폴더
    #[serde(default = "default_save_base_folder")]
    pub base_folder: PathBuf,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_save_interval_secs(),
            folder: default_save_folder(),
            base_folder: default_save_base_folder(),
        }
    }
}

// ============================================================
// AppConfig impl
// ============================================================

impl AppConfig {
    /// 기본 설정값 반환
    pub fn default_config() -> Self {
        Self {
            device: DeviceConfig::default(),
            capture: CaptureConfig::default(),
            diagnostics: DiagnosticsConfig::default(),
            save: SaveConfig::default(),
        }
    }

    /// 설정값 유효성 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if !self.capture.interval_secs.is_finite() || self.capture.interval_secs < 0.0 {
            return Err(CoreError::Config(format!(
                "capture.interval_secs 값이 잘못됨: {}",
                self.capture.interval_secs
            )));
        }
        if self.capture.retry_tries == 0 {
            return Err(CoreError::Config(
                "capture.retry_tries는 1 이상이어야 함".to_string(),
            ));
        }
        if self.diagnostics.save_error && self.diagnostics.screenshot_length == 0 {
            return Err(CoreError::Config(
                "diagnostics.screenshot_length는 1 이상이어야 함".to_string(),
            ));
        }
        if !self.save.interval_secs.is_finite() || self.save.interval_secs < 0.0 {
            return Err(CoreError::Config(format!(
                "save.interval_secs 값이 잘못됨: {}",
                self.save.interval_secs
            )));
        }
        if self.capture.method == CaptureMethod::Uiautomator2
            && !self.device.uiautomator2_url.starts_with("http")
        {
            return Err(CoreError::Config(format!(
                "uiautomator2_url은 http(s) 주소여야 함: {}",
                self.device.uiautomator2_url
            )));
        }
        Ok(())
    }

    /// 시도 간 대기를 Duration으로 반환
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.capture.retry_delay_ms)
    }

    /// 전송 타임아웃을 Duration으로 반환
    pub fn transport_timeout(&self) -> Duration {
        Duration::from_millis(self.device.transport_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_adb_path() -> PathBuf {
    PathBuf::from("adb")
}
fn default_ascreencap_path() -> String {
    "/data/local/tmp/ascreencap".to_string()
}
fn default_uiautomator2_url() -> String {
    "http://127.0.0.1:7912".to_string()
}
fn default_transport_timeout_ms() -> u64 {
    10_000
}
fn default_interval_secs() -> f64 {
    MIN_CAPTURE_INTERVAL_SECS
}
fn default_retry_tries() -> u32 {
    10
}
fn default_retry_delay_ms() -> u64 {
    3_000
}
fn default_screenshot_length() -> usize {
    60
}
fn default_error_folder() -> PathBuf {
    PathBuf::from("./log/error")
}
fn default_save_interval_secs() -> f64 {
    60.0
}
fn default_save_folder() -> PathBuf {
    PathBuf::from("./screenshots")
}
fn default_save_base_folder() -> PathBuf {
    PathBuf::from("./screenshots_base")
}
