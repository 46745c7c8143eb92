//! remocap 핵심 에러 타입.
//!
//! 어댑터(백엔드, 디코더)는 자체 에러를 `CoreError`로 매핑해서 반환한다.

use thiserror::Error;

/// 코어 레이어 에러.
/// 전송, 디코딩, 설정, 저장 단계의 에러를 정의한다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 캡처 백엔드(디바이스 링크) 실패: 재시도 대상
    #[error("전송 에러: {0}")]
    Transport(String),

    /// 모든 바이트 정규화 변형이 디코딩에 실패: 재시도 대상
    #[error("디코딩 에러: {0}")]
    Decode(String),

    /// 설정값 오류 (알 수 없는 캡처 백엔드 등): 즉시 반환
    #[error("설정 에러: {0}")]
    Config(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 이미지 인코딩/저장 실패
    #[error("이미지 저장 에러: {0}")]
    Image(#[from] image::ImageError),

    /// 저장할 현재 스크린샷이 없음
    #[error("현재 스크린샷 없음: screenshot()을 먼저 호출해야 함")]
    NoImage,

    /// 종료 신호로 대기가 중단됨
    #[error("종료 신호로 취소됨")]
    Cancelled,

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl CoreError {
    /// 재시도로 회복될 수 있는 에러인지 판별
    pub fn is_retryable(&self) -> bool {
        !matches!(self, CoreError::Config(_) | CoreError::Cancelled)
    }

    /// 에러 종류 이름 (로그/테스트용)
    pub fn kind(&self) -> &'static str {
        match self {
            CoreError::Transport(_) => "Transport",
            CoreError::Decode(_) => "Decode",
            CoreError::Config(_) => "Config",
            CoreError::Io(_) => "Io",
            CoreError::Image(_) => "Image",
            CoreError::NoImage => "NoImage",
            CoreError::Cancelled => "Cancelled",
            CoreError::Internal(_) => "Internal",
        }
    }
}
