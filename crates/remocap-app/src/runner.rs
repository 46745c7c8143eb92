//! 캡처 루프.
//!
//! 세션에서 스크린샷을 반복 획득하고, 카테고리가 지정되면 저장 쓰로틀을 거쳐 저장한다.
//! 최종 캡처 실패 시 진단 버퍼를 에러 폴더에 덤프한다.

use remocap_capture::CaptureSession;
use remocap_core::error::CoreError;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 캡처 루프 설정
#[derive(Debug, Clone, Default)]
pub struct RunnerConfig {
    /// 캡처 횟수 (0 = 종료 신호까지)
    pub count: u64,
    /// 저장 카테고리 (None이면 저장 안 함)
    pub save_category: Option<String>,
    /// 기본(base) 폴더에 저장
    pub to_base_folder: bool,
    /// 진단 덤프 폴더 (None이면 덤프 안 함)
    pub error_folder: Option<PathBuf>,
}

/// 실행 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub captured: u64,
    pub saved: u64,
}

/// 캡처 루프 실행기
pub struct CaptureRunner {
    session: Arc<CaptureSession>,
    config: RunnerConfig,
}

impl CaptureRunner {
    pub fn new(session: Arc<CaptureSession>, config: RunnerConfig) -> Self {
        Self { session, config }
    }

    /// 루프 실행. 종료 신호로 인한 중단은 정상 종료로 취급한다
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) -> Result<RunSummary, CoreError> {
        let mut summary = RunSummary::default();
        info!(
            "캡처 시작: {}회, 저장 카테고리 {:?}",
            if self.config.count == 0 {
                "무제한".to_string()
            } else {
                self.config.count.to_string()
            },
            self.config.save_category
        );

        while self.config.count == 0 || summary.captured < self.config.count {
            if *shutdown_rx.borrow() {
                break;
            }

            match self.session.screenshot().await {
                Ok(shot) => {
                    summary.captured += 1;
                    let (w, h) = shot.resolution();
                    info!("스크린샷 #{}: {w}x{h}", summary.captured);
                }
                Err(CoreError::Cancelled) => break,
                Err(e) => {
                    error!("캡처 실패 ({}): {e}", e.kind());
                    self.dump_diagnostics().await;
                    return Err(e);
                }
            }

            if let Some(category) = &self.config.save_category {
                if self
                    .session
                    .save_screenshot(category, None, self.config.to_base_folder)
                    .await?
                {
                    summary.saved += 1;
                }
            }
        }

        info!(
            "캡처 종료: {}장 캡처, {}장 저장",
            summary.captured, summary.saved
        );
        Ok(summary)
    }

    async fn dump_diagnostics(&self) {
        let Some(folder) = &self.config.error_folder else {
            return;
        };
        match self.session.dump_diagnostics(folder).await {
            Ok(0) => {}
            Ok(n) => info!("진단 스크린샷 {n}장: {}", folder.display()),
            Err(e) => warn!("진단 덤프 실패: {e}"),
        }
    }
}
