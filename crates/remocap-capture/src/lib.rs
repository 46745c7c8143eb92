//! # remocap-capture
//!
//! 원격 디바이스 스크린 캡처 파이프라인.
//! 전송 계층 바이트 정규화, 적응형 디코딩, 재시도, 캡처/저장 쓰로틀,
//! 진단 링 버퍼, 캡처 백엔드 어댑터, 그리고 이들을 묶는 캡처 세션을 담당한다.

pub mod backends;
pub mod codec;
pub mod normalizer;
mod persist;
pub mod retry;
pub mod ring_buffer;
pub mod save_throttle;
pub mod selector;
pub mod session;
pub mod throttle;

pub use normalizer::DecodeVariant;
pub use session::{CaptureSession, CaptureState};
