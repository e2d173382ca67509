//! # webtrack-core
//!
//! WEBTRACK 도메인 모델, 포트(trait) 정의, 에러 타입.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 메트릭/네트워크 교환 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`config`] — 트래커/네트워크 캡처 설정 구조체
//! - [`config_manager`] — 설정 검증, 런타임 부분 변경, 파일 로드
//! - [`ids`] — 세션 ID / trace id 생성

pub mod config;
pub mod config_manager;
pub mod error;
pub mod ids;
pub mod models;
pub mod ports;
