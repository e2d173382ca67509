//! # webtrack-capture
//!
//! 네트워크 캡처 어댑터.
//! 요청 필터링, 응답 분류, 본문 캡처, trace id 상관관계를 담당하며
//! 분류 결과는 `MetricSink` 포트로 제출한다.
//!
//! ## 구조
//!
//! - [`filter`] — 자기 보고/허용/차단 목록 + 샘플링
//! - [`classifier`] — 성공/실패 판정, 타임아웃, 비즈니스 코드 추출
//! - [`content`] — 본문 요약/잘라내기
//! - [`trace`] — same-origin 판정, trace 헤더 주입
//! - [`network_capture`] — `Plugin` 구현체

pub mod classifier;
pub mod content;
pub mod filter;
pub mod network_capture;
pub mod trace;

pub use classifier::{BusinessCodeParser, Classifier, DefaultBusinessCodeParser};
pub use network_capture::{NetworkCapture, ObservedResponse, OutgoingRequest, RequestTicket};
