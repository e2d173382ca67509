//! # webtrack-tracker
//!
//! WEBTRACK 트래커 — 메트릭 버퍼링/flush 컨트롤러.
//! 샘플링, 컨텍스트 보강, 용량 기반 flush, 전송 실패 재병합, 플러그인
//! 레지스트리를 담당하고 배치 전송은 `MetricReporter` 포트에 위임한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use webtrack_core::config::TrackerConfig;
//! use webtrack_core::models::metric::Metric;
//! use webtrack_tracker::Tracker;
//!
//! let tracker = Tracker::new(
//!     TrackerConfig::new("shop").with_report_url("https://collect.example.com/report"),
//! )?;
//! tracker.send(vec![Metric::js_error("boom")], false).await?;
//! tracker.destroy().await?;
//! ```

pub mod logging;
pub mod merge;
pub mod tracker;

pub use merge::merge_failed;
pub use tracker::{BeforeSend, Tracker, TrackerBuilder, TrackerStats};
