//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! `remocap-capture`의 어댑터가 이 trait들을 구현하며,
//! 캡처 세션은 `Box<dyn T>` / `Arc<dyn T>`로 주입받는다.
//!
//! async trait은 `async_trait` 매크로를 사용하여 object safety를 보장한다.

pub mod capture;
pub mod decoder;
