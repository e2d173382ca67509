//! 메트릭 싱크 포트.
//!
//! 캡처 어댑터가 관측 결과를 제출하는 단일 호출 계약.
//! 구현: `webtrack-tracker` crate (`Tracker`)

use async_trait::async_trait;

use crate::config::TrackerConfig;
use crate::error::CoreError;
use crate::models::metric::Metric;

/// 메트릭 제출 대상
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// 메트릭 제출 (샘플링/보강/버퍼링은 싱크가 담당)
    async fn submit(&self, metrics: Vec<Metric>, immediate: bool) -> Result<(), CoreError>;

    /// 현재 설정 스냅샷 — 어댑터의 자기 보고 필터, same-origin 판정에 사용
    fn config_snapshot(&self) -> TrackerConfig;
}
