//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 캡처 어댑터와 전송 어댑터가 이 trait들을 구현하며,
//! 트래커는 `Arc<dyn T>`로 와이어링한다.
//!
//! async trait은 `async_trait` 매크로로 object safety를 보장한다.

pub mod plugin;
pub mod reporter;
pub mod sampler;
pub mod sink;
pub mod transport;
