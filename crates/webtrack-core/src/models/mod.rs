//! WEBTRACK 도메인 모델.
//!
//! 캡처 → 분류 → 버퍼 → 전송 파이프라인이 공유하는 데이터 구조체.

pub mod exchange;
pub mod metric;
