//! 설정 및 와이어링 통합 테스트.
//!
//! AppConfig / ConfigManager → 백엔드 / 세션 생성 검증.

use remocap_capture::backends::{create_backend, AdbShell};
use remocap_capture::codec::ImageCrateDecoder;
use remocap_capture::CaptureSession;
use remocap_core::config::{AppConfig, CaptureMethod};
use remocap_core::config_manager::ConfigManager;
use remocap_core::error::CoreError;
use remocap_core::ports::capture::DeviceShell;
use remocap_core::ports::decoder::ImageDecoder;
use std::sync::Arc;
use std::time::Duration;

fn shell_for(config: &AppConfig) -> Arc<dyn DeviceShell> {
    Arc::new(AdbShell::from_config(config))
}

fn decoder() -> Arc<dyn ImageDecoder> {
    Arc::new(ImageCrateDecoder::new())
}

#[test]
fn config_defaults_are_valid() {
    let config = AppConfig::default_config();
    config.validate().unwrap();

    assert_eq!(config.capture.method, CaptureMethod::Adb);
    assert_eq!(config.capture.retry_tries, 10);
    assert_eq!(config.retry_delay(), Duration::from_secs(3));
    assert!(!config.diagnostics.save_error);
    assert_eq!(config.diagnostics.screenshot_length, 60);
    assert!(config.transport_timeout() > Duration::ZERO);
}

#[test]
fn every_method_wires_into_a_session() {
    for method in [
        CaptureMethod::Adb,
        CaptureMethod::AScreenCap,
        CaptureMethod::Uiautomator2,
    ] {
        let mut config = AppConfig::default_config();
        config.capture.method = method;

        let backend = create_backend(&config, shell_for(&config), decoder()).unwrap();
        assert_eq!(backend.method(), method);

        let session = CaptureSession::new(backend, &config).unwrap();
        assert!((session.capture_interval() - 0.1).abs() < 1e-9);
    }
}

#[test]
fn out_of_range_interval_is_clamped_at_construction() {
    let mut config = AppConfig::default_config();
    config.capture.interval_secs = 7.5;

    let backend = create_backend(&config, shell_for(&config), decoder()).unwrap();
    let session = CaptureSession::new(backend, &config).unwrap();
    assert_eq!(session.capture_interval(), 1.0);
}

#[test]
fn invalid_config_fails_session_creation() {
    let mut config = AppConfig::default_config();
    config.capture.interval_secs = f64::NAN;

    let backend = create_backend(&config, shell_for(&config), decoder()).unwrap();
    let result = CaptureSession::new(backend, &config);
    assert!(matches!(result, Err(CoreError::Config(_))));
}

#[test]
fn config_manager_roundtrip_feeds_session() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("remocap").join("config.json");

    let manager = ConfigManager::with_path(path.clone()).unwrap();
    assert!(path.exists());

    let mut updated = manager.get();
    updated.capture.method = CaptureMethod::AScreenCap;
    updated.diagnostics.save_error = true;
    updated.diagnostics.screenshot_length = 5;
    manager.update(updated).unwrap();
    assert_eq!(manager.get().capture.method, CaptureMethod::AScreenCap);

    let reloaded = ConfigManager::with_path(path).unwrap().get();
    assert_eq!(reloaded.capture.method, CaptureMethod::AScreenCap);
    assert!(reloaded.diagnostics.save_error);

    let backend = create_backend(&reloaded, shell_for(&reloaded), decoder()).unwrap();
    let session = CaptureSession::new(backend, &reloaded).unwrap();
    assert!(session.diagnostic_entries().is_empty());
}

#[test]
fn malformed_config_file_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("config.json");
    std::fs::write(&path, r#"{"capture":{"method":"scrcpy"}}"#).unwrap();

    assert!(ConfigManager::with_path(path).is_err());
}

#[test]
fn method_names_parse() {
    assert_eq!("ADB".parse::<CaptureMethod>().unwrap(), CaptureMethod::Adb);
    assert_eq!(
        "ascreencap".parse::<CaptureMethod>().unwrap(),
        CaptureMethod::AScreenCap
    );
    assert!(matches!(
        "minicap".parse::<CaptureMethod>(),
        Err(CoreError::Config(_))
    ));
}

#[tokio::test]
async fn save_without_capture_reports_no_image() {
    let config = AppConfig::default_config();
    let backend = create_backend(&config, shell_for(&config), decoder()).unwrap();
    let session = CaptureSession::new(backend, &config).unwrap();

    let result = session.save_screenshot("items", None, false).await;
    assert!(matches!(result, Err(CoreError::NoImage)));
}
