//! # remocap-app
//!
//! remocap 바이너리 진입점.
//! 설정 로드, 어댑터 와이어링, 라이프사이클 관리, 캡처 루프 실행.

mod lifecycle;
mod runner;

use anyhow::{Context, Result};
use clap::Parser;
use remocap_capture::backends::{create_backend, AdbShell};
use remocap_capture::codec::ImageCrateDecoder;
use remocap_capture::CaptureSession;
use remocap_core::config::{AppConfig, CaptureMethod};
use remocap_core::config_manager::ConfigManager;
use remocap_core::ports::capture::DeviceShell;
use remocap_core::ports::decoder::ImageDecoder;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;
use crate::runner::{CaptureRunner, RunnerConfig};

/// 원격 디바이스 스크린 캡처
#[derive(Parser, Debug)]
#[command(name = "remocap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 config.json)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// adb 디바이스 시리얼 (예: 127.0.0.1:5555)
    #[arg(long, short = 's')]
    serial: Option<String>,

    /// 캡처 방식 (adb, ascreencap, uiautomator2)
    #[arg(long, short = 'm')]
    method: Option<CaptureMethod>,

    /// 캡처 횟수 (0 = Ctrl+C까지)
    #[arg(long, short = 'n', default_value_t = 1)]
    count: u64,

    /// 캡처 간격 (초, 0.1 ~ 1.0)
    #[arg(long, short = 'i')]
    interval: Option<f64>,

    /// 저장 카테고리: 지정 시 저장 쓰로틀을 거쳐 PNG로 저장
    #[arg(long)]
    save: Option<String>,

    /// 일반 폴더 대신 base 폴더에 저장
    #[arg(long)]
    base_folder: bool,

    /// CLI로 덮어쓴 설정을 설정 파일에 저장
    #[arg(long)]
    save_config: bool,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

/// 설정 관리자 열기. 경로 미지정 시 플랫폼 기본 경로, 실패하면 None (기본 설정 사용)
fn open_config(path: Option<&PathBuf>) -> Result<Option<ConfigManager>> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path.clone())
            .with_context(|| format!("설정 파일 로드 실패: {}", path.display()))?,
        None => match ConfigManager::new() {
            Ok(manager) => manager,
            Err(e) => {
                warn!("설정 관리자 초기화 실패, 기본 설정 사용: {e}");
                return Ok(None);
            }
        },
    };
    info!("설정 파일: {}", manager.config_path().display());
    Ok(Some(manager))
}

/// 설정 파일 + CLI 덮어쓰기 → 검증된 최종 설정. `--save-config`면 파일에도 저장
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let manager = open_config(args.config.as_ref())?;
    let mut config = manager
        .as_ref()
        .map_or_else(AppConfig::default_config, ConfigManager::get);
    apply_overrides(&mut config, args);
    config.validate().context("설정 검증 실패")?;

    if args.save_config {
        let manager = manager.context("설정 파일을 열 수 없어 --save-config를 적용할 수 없음")?;
        manager.update(config.clone()).context("설정 저장 실패")?;
        info!("설정 저장: {}", manager.config_path().display());
    }
    Ok(config)
}

/// CLI 인자로 설정 덮어쓰기
fn apply_overrides(config: &mut AppConfig, args: &Args) {
    if let Some(serial) = &args.serial {
        config.device.serial = Some(serial.clone());
    }
    if let Some(method) = args.method {
        config.capture.method = method;
    }
    if let Some(interval) = args.interval {
        config.capture.interval_secs = interval;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let config = resolve_config(&args)?;

    info!(
        "remocap 시작: 방식 {}, 디바이스 {}",
        config.capture.method,
        config.device.serial.as_deref().unwrap_or("(기본)")
    );

    let lifecycle = Arc::new(LifecycleManager::new());

    let shell: Arc<dyn DeviceShell> = Arc::new(AdbShell::from_config(&config));
    let decoder: Arc<dyn ImageDecoder> = Arc::new(ImageCrateDecoder::new());
    let backend =
        create_backend(&config, shell, Arc::clone(&decoder)).context("캡처 백엔드 생성 실패")?;
    let session = Arc::new(
        CaptureSession::new(backend, &config)
            .context("캡처 세션 생성 실패")?
            .with_decoder(decoder)
            .with_shutdown(lifecycle.subscribe()),
    );

    let signal_lifecycle = Arc::clone(&lifecycle);
    tokio::spawn(async move {
        if let Err(e) = signal_lifecycle.wait_for_signal().await {
            warn!("시그널 핸들러 등록 실패: {e}");
        }
    });

    let runner = CaptureRunner::new(
        session,
        RunnerConfig {
            count: args.count,
            save_category: args.save.clone(),
            to_base_folder: args.base_folder,
            error_folder: config
                .diagnostics
                .save_error
                .then(|| config.diagnostics.error_folder.clone()),
        },
    );

    let summary = runner
        .run(lifecycle.subscribe())
        .await
        .context("캡처 실패")?;

    if lifecycle.is_shutting_down() {
        info!("종료 신호로 캡처 중단");
    }
    info!(
        "remocap 종료: {}장 캡처, {}장 저장",
        summary.captured, summary.saved
    );
    Ok(())
}
