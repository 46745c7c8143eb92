//! 캡처 세션.
//!
//! 백엔드, 적응형 디코더, 재시도, 캡처/저장 쓰로틀, 진단 링 버퍼를 하나로 묶는다.
//! 디바이스마다 세션 하나. 세션 간 공유 상태는 없다.
//!
//! 상태 흐름: Idle → Throttling → Capturing → Decoding → (Success | Retry → Capturing | Failed)

use chrono::Utc;
use image::DynamicImage;
use parking_lot::Mutex;
use remocap_core::config::{AppConfig, SaveConfig};
use remocap_core::error::CoreError;
use remocap_core::models::frame::{CaptureOutput, DecodedImage, DiagnosticEntry};
use remocap_core::ports::capture::CaptureBackend;
use remocap_core::ports::decoder::ImageDecoder;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::codec::{to_rgb, ImageCrateDecoder};
use crate::normalizer::DecodeVariant;
use crate::persist;
use crate::retry::RetryExecutor;
use crate::ring_buffer::DiagnosticRingBuffer;
use crate::save_throttle::SaveThrottle;
use crate::selector::{AdaptiveDecodeSelector, VariantOrder};
use crate::throttle::IntervalThrottle;

/// 캡처 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CaptureState {
    #[default]
    Idle,
    Throttling,
    Capturing,
    Decoding,
    Success,
    Retry,
    Failed,
}

impl CaptureState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Throttling => "throttling",
            Self::Capturing => "capturing",
            Self::Decoding => "decoding",
            Self::Success => "success",
            Self::Retry => "retry",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 캡처 세션
pub struct CaptureSession {
    backend: Box<dyn CaptureBackend>,
    selector: AdaptiveDecodeSelector,
    retry: RetryExecutor,
    throttle: IntervalThrottle,
    save_throttle: SaveThrottle,
    /// `diagnostics.save_error`가 꺼져 있으면 None
    diagnostics: Option<Mutex<DiagnosticRingBuffer>>,
    current: Mutex<Option<DecodedImage>>,
    state: Mutex<CaptureState>,
    /// screenshot() 전체 구간 직렬화
    capture_lock: tokio::sync::Mutex<()>,
    save: SaveConfig,
    shutdown: watch::Receiver<bool>,
}

impl CaptureSession {
    /// 새 세션 생성. 설정을 검증한 뒤 기본 디코더(image crate)를 사용한다
    pub fn new(backend: Box<dyn CaptureBackend>, config: &AppConfig) -> Result<Self, CoreError> {
        config.validate()?;

        let diagnostics = config
            .diagnostics
            .save_error
            .then(|| Mutex::new(DiagnosticRingBuffer::new(config.diagnostics.screenshot_length)));

        info!(
            "캡처 세션 생성: 백엔드 {}, 간격 {:.3}s, 재시도 {}회/{:?}, 진단 버퍼 {}",
            backend.method(),
            config.capture.interval_secs,
            config.capture.retry_tries,
            config.retry_delay(),
            diagnostics
                .as_ref()
                .map_or(0, |_| config.diagnostics.screenshot_length)
        );

        Ok(Self {
            backend,
            selector: AdaptiveDecodeSelector::new(Arc::new(ImageCrateDecoder::new())),
            retry: RetryExecutor::new(config.capture.retry_tries, config.retry_delay()),
            throttle: IntervalThrottle::new(config.capture.interval_secs),
            save_throttle: SaveThrottle::new(),
            diagnostics,
            current: Mutex::new(None),
            state: Mutex::new(CaptureState::Idle),
            capture_lock: tokio::sync::Mutex::new(()),
            save: config.save.clone(),
            shutdown: watch::channel(false).1,
        })
    }

    /// 디코더 교체 (변형 순서는 기본값으로)
    pub fn with_decoder(mut self, decoder: Arc<dyn ImageDecoder>) -> Self {
        self.selector = AdaptiveDecodeSelector::new(decoder);
        self
    }

    /// 기본 변형 순서 지정
    pub fn with_variant_order(
        mut self,
        decoder: Arc<dyn ImageDecoder>,
        order: Vec<DecodeVariant>,
    ) -> Result<Self, CoreError> {
        self.selector = AdaptiveDecodeSelector::with_order(decoder, VariantOrder::new(order)?);
        Ok(self)
    }

    /// 종료 신호 연결: 쓰로틀 대기와 재시도 대기가 중단된다
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.retry = self.retry.with_shutdown(shutdown.clone());
        self.shutdown = shutdown;
        self
    }

    /// 스크린샷 한 장 획득.
    ///
    /// 쓰로틀 대기 후 캡처+디코딩을 재시도 실행기로 감싼다.
    /// 성공한 이미지는 현재 이미지가 되고, 진단 버퍼가 켜져 있으면 함께 보관된다.
    pub async fn screenshot(&self) -> Result<DecodedImage, CoreError> {
        let _guard = self.capture_lock.lock().await;
        let started = Instant::now();

        let result = self.throttled_capture().await;
        match result {
            Ok(image) => {
                let decoded = DecodedImage::new(image);
                if let Some(diagnostics) = &self.diagnostics {
                    diagnostics.lock().push(DiagnosticEntry::from(&decoded));
                }
                *self.current.lock() = Some(decoded.clone());
                self.set_state(CaptureState::Success);

                let (w, h) = decoded.resolution();
                debug!("스크린샷 {w}x{h} ({:.3}s)", started.elapsed().as_secs_f64());
                Ok(decoded)
            }
            Err(e) => {
                self.set_state(CaptureState::Failed);
                Err(e)
            }
        }
    }

    async fn throttled_capture(&self) -> Result<DynamicImage, CoreError> {
        let mut shutdown = self.shutdown.clone();
        self.set_state(CaptureState::Throttling);
        self.throttle.wait(&mut shutdown).await?;
        self.throttle.reset();

        self.retry.execute(move || self.capture_once()).await
    }

    /// 캡처 1회 + 디코딩. 실패 시 Retry 상태로 남는다
    async fn capture_once(&self) -> Result<DynamicImage, CoreError> {
        self.set_state(CaptureState::Capturing);
        let result = match self.backend.capture().await {
            Ok(CaptureOutput::Decoded(image)) => Ok(to_rgb(image)),
            Ok(CaptureOutput::Raw(raw)) => {
                self.set_state(CaptureState::Decoding);
                self.selector.decode(&raw).map(|(image, _)| image)
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.set_state(CaptureState::Retry);
        }
        result
    }

    /// 현재 이미지를 카테고리 폴더에 저장.
    ///
    /// 저장 쓰로틀을 통과했을 때만 `<folder>/<category>/<epoch_ms>.png`를 쓰고 true를 반환한다.
    /// `interval`이 없으면 `save.interval_secs`를 사용한다.
    pub async fn save_screenshot(
        &self,
        category: &str,
        interval: Option<f64>,
        to_base_folder: bool,
    ) -> Result<bool, CoreError> {
        validate_category(category)?;
        let current = self.current_image().ok_or(CoreError::NoImage)?;

        let interval_secs = interval.unwrap_or(self.save.interval_secs);
        let interval = Duration::try_from_secs_f64(interval_secs)
            .map_err(|_| CoreError::Config(format!("저장 간격 값이 잘못됨: {interval_secs}")))?;

        let now = Utc::now();
        if !self.save_throttle.should_save(category, now, interval) {
            return Ok(false);
        }

        let root = if to_base_folder {
            &self.save.base_folder
        } else {
            &self.save.folder
        };
        let path = persist::write_png(&root.join(category), now, current.image).await?;
        info!("스크린샷 저장: {}", path.display());
        Ok(true)
    }

    /// 다음 저장이 시간과 무관하게 통과하도록 초기화
    pub fn reset_save_timer(&self, category: &str) {
        self.save_throttle.reset(category);
    }

    /// 캡처 간격 변경 (0.1 ~ 1.0초 클램프). 적용된 초를 반환
    pub fn set_capture_interval(&self, seconds: f64) -> f64 {
        self.throttle.set_interval(seconds).as_secs_f64()
    }

    /// 현재 캡처 간격 (초)
    pub fn capture_interval(&self) -> f64 {
        self.throttle.interval().as_secs_f64()
    }

    /// 마지막으로 성공한 스크린샷
    pub fn current_image(&self) -> Option<DecodedImage> {
        self.current.lock().clone()
    }

    /// 진단 버퍼 스냅샷 (오래된 순). 비활성화 시 빈 목록
    pub fn diagnostic_entries(&self) -> Vec<DiagnosticEntry> {
        self.diagnostics
            .as_ref()
            .map(|d| d.lock().snapshot())
            .unwrap_or_default()
    }

    /// 진단 버퍼 전체를 `<folder>/<epoch_ms>.png`로 기록하고 개수를 반환
    pub async fn dump_diagnostics(&self, folder: &Path) -> Result<usize, CoreError> {
        let entries = self.diagnostic_entries();
        for entry in &entries {
            persist::write_png(folder, entry.captured_at, Arc::clone(&entry.image)).await?;
        }
        if !entries.is_empty() {
            info!("진단 스크린샷 {}장 저장: {}", entries.len(), folder.display());
        }
        Ok(entries.len())
    }

    /// 현재 디코딩 변형 순서
    pub fn variant_order(&self) -> Vec<DecodeVariant> {
        self.selector.order()
    }

    /// 현재 상태
    pub fn state(&self) -> CaptureState {
        *self.state.lock()
    }

    fn set_state(&self, state: CaptureState) {
        *self.state.lock() = state;
    }
}

/// 카테고리는 단일 경로 구성요소여야 한다
fn validate_category(category: &str) -> Result<(), CoreError> {
    let invalid = category.is_empty()
        || category == "."
        || category == ".."
        || category.contains(['/', '\\']);
    if invalid {
        return Err(CoreError::Config(format!("잘못된 저장 카테고리: {category:?}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{inject_crlf, sample_image, sample_png};
    use async_trait::async_trait;
    use remocap_core::config::CaptureMethod;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 미리 정한 응답을 차례로 돌려주는 백엔드. 응답이 떨어지면 Transport 에러
    struct ScriptedBackend {
        script: Mutex<VecDeque<Result<CaptureOutput, CoreError>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<CaptureOutput, CoreError>>) -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            let backend = Self {
                script: Mutex::new(script.into()),
                calls: Arc::clone(&calls),
            };
            (backend, calls)
        }

        fn repeating_png(n: usize) -> (Self, Arc<AtomicUsize>) {
            Self::new((0..n).map(|_| Ok(CaptureOutput::Raw(sample_png()))).collect())
        }
    }

    #[async_trait]
    impl CaptureBackend for ScriptedBackend {
        fn method(&self) -> CaptureMethod {
            CaptureMethod::Adb
        }

        async fn capture(&self) -> Result<CaptureOutput, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(CoreError::Transport("device offline".into())))
        }
    }

    fn test_config(root: &Path) -> AppConfig {
        let mut config = AppConfig::default_config();
        config.capture.retry_tries = 3;
        config.capture.retry_delay_ms = 1;
        config.save.folder = root.join("screenshots");
        config.save.base_folder = root.join("screenshots_base");
        config.diagnostics.error_folder = root.join("error");
        config
    }

    fn session_with(
        script: Vec<Result<CaptureOutput, CoreError>>,
        config: &AppConfig,
    ) -> (CaptureSession, Arc<AtomicUsize>) {
        let (backend, calls) = ScriptedBackend::new(script);
        (CaptureSession::new(Box::new(backend), config).unwrap(), calls)
    }

    fn png_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn screenshot_recovers_crlf_payload() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = inject_crlf(&sample_png());
        let (session, _) = session_with(vec![Ok(CaptureOutput::Raw(raw))], &test_config(tmp.path()));
        assert_eq!(session.state(), CaptureState::Idle);

        let shot = session.screenshot().await.unwrap();

        assert_eq!(shot.resolution(), (32, 24));
        assert_eq!(session.state(), CaptureState::Success);
        assert_eq!(session.variant_order()[0], DecodeVariant::CrLf);
        assert!(session.current_image().is_some());
    }

    #[tokio::test]
    async fn transport_errors_are_retried() {
        let tmp = tempfile::tempdir().unwrap();
        let (session, calls) = session_with(
            vec![
                Err(CoreError::Transport("closed".into())),
                Err(CoreError::Transport("closed".into())),
                Ok(CaptureOutput::Raw(sample_png())),
            ],
            &test_config(tmp.path()),
        );

        session.screenshot().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_fails_and_resets_order() {
        let tmp = tempfile::tempdir().unwrap();
        let garbage = || Ok(CaptureOutput::Raw(b"error: device unauthorized".to_vec()));
        let (session, calls) = session_with(
            vec![
                Ok(CaptureOutput::Raw(inject_crlf(&sample_png()))),
                garbage(),
                garbage(),
                garbage(),
            ],
            &test_config(tmp.path()),
        );

        session.screenshot().await.unwrap();
        assert_eq!(session.variant_order()[0], DecodeVariant::CrLf);

        let result = session.screenshot().await;
        assert!(matches!(result, Err(CoreError::Decode(_))));
        assert_eq!(session.state(), CaptureState::Failed);
        assert_eq!(session.variant_order(), DecodeVariant::ALL.to_vec());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 실패해도 이전 이미지는 유지
        assert!(session.current_image().is_some());
    }

    #[tokio::test]
    async fn decoded_output_skips_selector() {
        let tmp = tempfile::tempdir().unwrap();
        let rgba = DynamicImage::ImageRgba8(sample_image().to_rgba8());
        let (session, _) = session_with(
            vec![Ok(CaptureOutput::Decoded(rgba))],
            &test_config(tmp.path()),
        );

        let shot = session.screenshot().await.unwrap();
        assert!(shot.image.as_rgb8().is_some());
        assert_eq!(session.variant_order(), DecodeVariant::ALL.to_vec());
    }

    #[tokio::test]
    async fn save_before_capture_is_no_image() {
        let tmp = tempfile::tempdir().unwrap();
        let (session, _) = session_with(vec![], &test_config(tmp.path()));

        let result = session.save_screenshot("items", None, false).await;
        assert!(matches!(result, Err(CoreError::NoImage)));
    }

    #[tokio::test]
    async fn save_is_throttled_per_category() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let (backend, _) = ScriptedBackend::repeating_png(1);
        let session = CaptureSession::new(Box::new(backend), &config).unwrap();
        session.screenshot().await.unwrap();

        assert!(session.save_screenshot("items", None, false).await.unwrap());
        assert!(!session.save_screenshot("items", None, false).await.unwrap());
        assert!(session.save_screenshot("combat", Some(60.0), false).await.unwrap());

        let files = png_files(&config.save.folder.join("items"));
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with(".png"));
        let stem = files[0].trim_end_matches(".png");
        assert!(stem.parse::<i64>().unwrap() > 1_600_000_000_000);
    }

    #[tokio::test]
    async fn reset_save_timer_forces_next_save() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let (backend, _) = ScriptedBackend::repeating_png(1);
        let session = CaptureSession::new(Box::new(backend), &config).unwrap();
        session.screenshot().await.unwrap();

        assert!(session.save_screenshot("items", None, true).await.unwrap());
        session.reset_save_timer("items");
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(session.save_screenshot("items", None, true).await.unwrap());

        assert_eq!(png_files(&config.save.base_folder.join("items")).len(), 2);
        assert!(!config.save.folder.exists());
    }

    #[tokio::test]
    async fn invalid_category_and_interval_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, _) = ScriptedBackend::repeating_png(1);
        let session = CaptureSession::new(Box::new(backend), &test_config(tmp.path())).unwrap();
        session.screenshot().await.unwrap();

        for bad in ["", "..", "a/b"] {
            let result = session.save_screenshot(bad, None, false).await;
            assert!(matches!(result, Err(CoreError::Config(_))), "{bad:?}");
        }
        let result = session.save_screenshot("items", Some(-1.0), false).await;
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn diagnostics_keep_latest_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.diagnostics.save_error = true;
        config.diagnostics.screenshot_length = 2;
        let (backend, _) = ScriptedBackend::repeating_png(3);
        let session = CaptureSession::new(Box::new(backend), &config).unwrap();

        let mut shots = Vec::new();
        for _ in 0..3 {
            shots.push(session.screenshot().await.unwrap());
        }

        let entries = session.diagnostic_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].captured_at, shots[1].captured_at);
        assert_eq!(entries[1].captured_at, shots[2].captured_at);
        assert!(Arc::ptr_eq(&entries[1].image, &shots[2].image));

        let dumped = session.dump_diagnostics(&config.diagnostics.error_folder).await.unwrap();
        assert_eq!(dumped, 2);
        assert_eq!(png_files(&config.diagnostics.error_folder).len(), 2);
    }

    #[tokio::test]
    async fn diagnostics_disabled_keeps_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = test_config(tmp.path());
        let (backend, _) = ScriptedBackend::repeating_png(1);
        let session = CaptureSession::new(Box::new(backend), &config).unwrap();
        session.screenshot().await.unwrap();

        assert!(session.diagnostic_entries().is_empty());
        assert_eq!(session.dump_diagnostics(tmp.path()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn capture_interval_is_clamped() {
        let tmp = tempfile::tempdir().unwrap();
        let (session, _) = session_with(vec![], &test_config(tmp.path()));

        assert_eq!(session.set_capture_interval(5.0), 1.0);
        assert!((session.set_capture_interval(0.01) - 0.1).abs() < 1e-9);
        assert!((session.capture_interval() - 0.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn consecutive_screenshots_respect_interval() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, _) = ScriptedBackend::repeating_png(2);
        let session = CaptureSession::new(Box::new(backend), &test_config(tmp.path())).unwrap();
        session.set_capture_interval(0.3);

        let first = session.screenshot().await.unwrap();
        let second = session.screenshot().await.unwrap();

        let gap = second.captured_at - first.captured_at;
        assert!(gap.num_milliseconds() >= 250, "{gap}");
    }

    #[tokio::test]
    async fn shutdown_cancels_throttle_wait() {
        let tmp = tempfile::tempdir().unwrap();
        let (tx, rx) = watch::channel(false);
        let (backend, calls) = ScriptedBackend::repeating_png(1);
        let session = CaptureSession::new(Box::new(backend), &test_config(tmp.path()))
            .unwrap()
            .with_shutdown(rx);
        session.set_capture_interval(1.0);
        session.screenshot().await.unwrap();

        tx.send(true).unwrap();
        let result = session.screenshot().await;

        assert!(matches!(result, Err(CoreError::Cancelled)));
        assert_eq!(session.state(), CaptureState::Failed);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.capture.retry_tries = 0;
        let (backend, _) = ScriptedBackend::new(vec![]);

        let result = CaptureSession::new(Box::new(backend), &config);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[tokio::test]
    async fn custom_variant_order_is_default() {
        let tmp = tempfile::tempdir().unwrap();
        let (backend, _) = ScriptedBackend::repeating_png(1);
        let session = CaptureSession::new(Box::new(backend), &test_config(tmp.path()))
            .unwrap()
            .with_variant_order(
                Arc::new(ImageCrateDecoder::new()),
                vec![DecodeVariant::CrCrLf, DecodeVariant::Raw],
            )
            .unwrap();

        assert_eq!(
            session.variant_order(),
            vec![DecodeVariant::CrCrLf, DecodeVariant::Raw]
        );
        session.screenshot().await.unwrap();
        assert_eq!(session.variant_order().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_screenshots_are_serialized() {
        struct SlowBackend {
            in_flight: AtomicUsize,
            max_seen: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl CaptureBackend for SlowBackend {
            fn method(&self) -> CaptureMethod {
                CaptureMethod::Adb
            }

            async fn capture(&self) -> Result<CaptureOutput, CoreError> {
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok(CaptureOutput::Decoded(sample_image()))
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        let max_seen = Arc::new(AtomicUsize::new(0));
        let backend = SlowBackend {
            in_flight: AtomicUsize::new(0),
            max_seen: Arc::clone(&max_seen),
        };
        let session =
            Arc::new(CaptureSession::new(Box::new(backend), &test_config(tmp.path())).unwrap());

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let session = Arc::clone(&session);
                tokio::spawn(async move { session.screenshot().await.map(|_| ()) })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), CaptureState::Success);
    }
}
