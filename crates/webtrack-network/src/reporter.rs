//! 메트릭 리포터 (전송 유닛).
//!
//! 배치를 전송 수단 우선순위에 따라 전달한다.
//! - immediate: 블로킹 request만 사용 (동시에 하나만 진행)
//! - 그 외: beacon → request → pixel 순서로 폴백
//!
//! 전송 실패는 `Err`로 보고되며 재큐잉은 호출자(트래커)의 책임이다.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};
use webtrack_core::error::CoreError;
use webtrack_core::models::metric::Metric;
use webtrack_core::ports::reporter::{
    DeliveryOutcome, MetricReporter, ReporterConfig, SkipReason, TransportKind,
};
use webtrack_core::ports::transport::{BeaconTransport, PixelTransport, RequestTransport};

use crate::beacon::BeaconClient;
use crate::http_client::HttpRequestTransport;
use crate::pixel::PixelClient;

/// 리포터가 사용할 전송 수단 묶음 (None = 사용 불가)
#[derive(Clone, Default)]
pub struct Transports {
    pub beacon: Option<Arc<dyn BeaconTransport>>,
    pub request: Option<Arc<dyn RequestTransport>>,
    pub pixel: Option<Arc<dyn PixelTransport>>,
}

/// 블로킹 전송 진행 플래그 해제 가드
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 메트릭 리포터 — `MetricReporter` 포트 구현
pub struct Reporter {
    transports: Transports,
    config: RwLock<ReporterConfig>,
    /// 파기 여부 (되돌릴 수 없음)
    destroyed: AtomicBool,
    /// 블로킹 전송 진행 중 여부 (상호 배제)
    in_flight: AtomicBool,
}

impl Reporter {
    /// reqwest 기반 기본 전송 수단으로 리포터 생성
    pub fn new(config: ReporterConfig, timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        let transports = Transports {
            beacon: Some(Arc::new(BeaconClient::new(client.clone()))),
            request: Some(Arc::new(HttpRequestTransport::with_client(client.clone()))),
            pixel: Some(Arc::new(PixelClient::new(client))),
        };
        Ok(Self::with_transports(config, transports))
    }

    /// 전송 수단 주입
    pub fn with_transports(config: ReporterConfig, transports: Transports) -> Self {
        Self {
            transports,
            config: RwLock::new(config),
            destroyed: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
        }
    }

    /// 현재 설정 (복제본)
    pub fn config(&self) -> ReporterConfig {
        self.config.read().clone()
    }

    /// 파기 여부
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }

    /// 블로킹 전송 진행 중 여부
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// 블로킹 request 전송 — 이미 진행 중이면 큐잉하지 않고 거부
    async fn send_request(
        &self,
        config: &ReporterConfig,
        url: &str,
        body: String,
    ) -> Result<(), CoreError> {
        let Some(request) = self
            .transports
            .request
            .as_ref()
            .filter(|t| t.is_available())
        else {
            return Err(CoreError::Network("request 전송 수단 없음".to_string()));
        };

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            error!("블로킹 전송이 이미 진행 중 — 요청 거부");
            return Err(CoreError::DeliveryInFlight);
        }
        let _guard = InFlightGuard(&self.in_flight);

        request.post_json(url, &config.headers, body).await
    }
}

#[async_trait]
impl MetricReporter for Reporter {
    async fn send(&self, batch: &[Metric], immediate: bool) -> Result<DeliveryOutcome, CoreError> {
        if self.is_destroyed() {
            warn!("파기된 리포터로 전송 시도 — 무시");
            return Ok(DeliveryOutcome::Skipped(SkipReason::Destroyed));
        }

        let config = self.config();
        let Some(url) = config.report_url.clone().filter(|u| !u.trim().is_empty()) else {
            error!("reportUrl 미설정 — {}개 메트릭 전송 불가", batch.len());
            return Ok(DeliveryOutcome::Skipped(SkipReason::NoEndpoint));
        };

        if batch.is_empty() {
            return Ok(DeliveryOutcome::Skipped(SkipReason::Empty));
        }

        let body = serde_json::to_string(batch)?;

        if immediate || config.report_immediately {
            debug!("즉시 전송: {}개 메트릭", batch.len());
            return self
                .send_request(&config, &url, body)
                .await
                .map(|_| DeliveryOutcome::Delivered(TransportKind::Request));
        }

        if let Some(beacon) = self.transports.beacon.as_ref().filter(|t| t.is_available()) {
            if beacon.send_beacon(&url, body.clone().into_bytes()) {
                debug!("beacon 큐잉: {}개 메트릭", batch.len());
                return Ok(DeliveryOutcome::Delivered(TransportKind::Beacon));
            }
            debug!("beacon 실패 — request로 폴백");
        }

        let request_error = match self.send_request(&config, &url, body.clone()).await {
            Ok(()) => return Ok(DeliveryOutcome::Delivered(TransportKind::Request)),
            Err(e) => e,
        };

        if let Some(pixel) = &self.transports.pixel {
            warn!("request 실패 ({request_error}) — 픽셀로 폴백");
            pixel.fire(&url, &body);
            return Ok(DeliveryOutcome::Delivered(TransportKind::Pixel));
        }

        error!("모든 전송 수단 실패: {request_error}");
        Err(request_error)
    }

    fn set_config(&self, config: ReporterConfig) {
        debug!("리포터 설정 변경: url={:?}", config.report_url);
        *self.config.write() = config;
    }

    fn destroy(&self) {
        if !self.destroyed.swap(true, Ordering::AcqRel) {
            debug!("리포터 파기");
        }
    }
}
