//! 메트릭 리포터 포트.
//!
//! 구현: `webtrack-network` crate (`Reporter` — beacon → request → pixel 폴백 체인)

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::config::TrackerConfig;
use crate::error::CoreError;
use crate::models::metric::Metric;

/// 전송 수단
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// 논블로킹, 페이지 언로드 이후에도 전송 (확인 없음, 큐잉 여부만 반환)
    Beacon,
    /// 블로킹 HTTP POST (응답 상태로 성공 판정)
    Request,
    /// 1×1 픽셀 GET — 최후 수단, 실패를 보고하지 않음
    Pixel,
}

/// 전송을 시도하지 않은 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 리포터가 파기됨
    Destroyed,
    /// 엔드포인트 미설정
    NoEndpoint,
    /// 빈 배치
    Empty,
}

/// 전송 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 해당 수단으로 전송됨 (Pixel은 확인되지 않은 전송)
    Delivered(TransportKind),
    /// 전송 시도 없음 — 배치는 유실되며 재큐잉 대상이 아니다
    Skipped(SkipReason),
}

/// 리포터 런타임 설정 (트래커 설정의 전송 관련 부분)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReporterConfig {
    pub report_url: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub report_immediately: bool,
}

impl From<&TrackerConfig> for ReporterConfig {
    fn from(config: &TrackerConfig) -> Self {
        Self {
            report_url: config.report_url.clone(),
            headers: config.headers.clone(),
            report_immediately: config.report_immediately,
        }
    }
}

/// 메트릭 배치 전송 유닛
#[async_trait]
pub trait MetricReporter: Send + Sync {
    /// 배치 전송
    ///
    /// `Err`는 전송 실패를 의미하며 호출자(트래커)가 배치를 재큐잉한다.
    async fn send(&self, batch: &[Metric], immediate: bool) -> Result<DeliveryOutcome, CoreError>;

    /// 엔드포인트/헤더 변경 (동기 반영)
    fn set_config(&self, config: ReporterConfig);

    /// 영구 비활성화 — 이후 send는 경고 후 no-op
    fn destroy(&self);
}
