//! uiautomator2 HTTP 백엔드.
//!
//! 디바이스의 uiautomator2 서버에서 `GET /screenshot/0`으로 PNG/JPEG를 받아
//! 곧바로 디코딩한다. HTTP 본문은 CR/LF 변형이 없으므로 정규화 단계를 건너뛴다.

use async_trait::async_trait;
use remocap_core::config::CaptureMethod;
use remocap_core::error::CoreError;
use remocap_core::models::frame::CaptureOutput;
use remocap_core::ports::capture::CaptureBackend;
use remocap_core::ports::decoder::ImageDecoder;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 스크린샷 엔드포인트
const SCREENSHOT_PATH: &str = "/screenshot/0";

/// uiautomator2 백엔드
pub struct Uiautomator2Backend {
    client: reqwest::Client,
    base_url: String,
    decoder: Arc<dyn ImageDecoder>,
}

impl Uiautomator2Backend {
    /// 새 백엔드 생성. 응답 본문은 `decoder`로 디코딩한다
    pub fn new(
        base_url: &str,
        timeout: Duration,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Config(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            decoder,
        })
    }

    fn screenshot_url(&self) -> String {
        format!("{}{SCREENSHOT_PATH}", self.base_url)
    }
}

#[async_trait]
impl CaptureBackend for Uiautomator2Backend {
    fn method(&self) -> CaptureMethod {
        CaptureMethod::Uiautomator2
    }

    async fn capture(&self) -> Result<CaptureOutput, CoreError> {
        let url = self.screenshot_url();
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::Transport(format!("uiautomator2 요청 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Transport(format!(
                "uiautomator2 응답 에러 ({status}): {url}"
            )));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CoreError::Transport(format!("uiautomator2 본문 읽기 실패: {e}")))?;
        debug!("uiautomator2 스크린샷 수신: {}bytes", body.len());

        let image = self.decoder.decode(&body)?;
        Ok(CaptureOutput::Decoded(image))
    }
}
