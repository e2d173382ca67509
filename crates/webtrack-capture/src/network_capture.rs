//! 네트워크 캡처 어댑터.
//!
//! fetch/XHR 계층이 요청 전후로 호출하는 훅을 제공한다.
//! - `prepare`: 요청 전송 직전. 필터 판정, trace id 주입, 시작 시각 기록
//! - `complete`: 응답(또는 전송 실패) 수신 후. 분류 후 API 메트릭 제출
//! - `observe`: 이미 끝난 교환을 한 번에 넘기는 경로 (trace 주입 없음)
//!
//! setup 전이거나 teardown 이후에는 모든 훅이 아무것도 하지 않는다.

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use webtrack_core::config::NetworkCaptureOptions;
use webtrack_core::error::CoreError;
use webtrack_core::ids;
use webtrack_core::models::exchange::{Body, RawExchange, SourceKind};
use webtrack_core::ports::plugin::Plugin;
use webtrack_core::ports::sampler::Sampler;
use webtrack_core::ports::sink::MetricSink;

use crate::classifier::{BusinessCodeParser, Classifier};
use crate::filter::RequestFilter;
use crate::trace::{attach_trace_id, is_same_origin};

/// 나가는 요청 — 헤더는 trace id 주입을 위해 가변으로 받는다
#[derive(Debug, Clone, Default)]
pub struct OutgoingRequest {
    pub url: String,
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Body>,
    pub source: SourceKind,
}

impl OutgoingRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_source(mut self, source: SourceKind) -> Self {
        self.source = source;
        self
    }
}

/// 수집 대상으로 판정된 진행 중 요청
#[derive(Debug, Clone)]
pub struct RequestTicket {
    url: String,
    method: String,
    started_at: i64,
    request_body: Option<Body>,
    source: SourceKind,
    trace_id: Option<String>,
}

impl RequestTicket {
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }
}

/// 관측된 응답
#[derive(Debug, Clone, Default)]
pub struct ObservedResponse {
    /// HTTP 상태 (0 = 전송 실패)
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Option<Body>,
    /// 전송 레벨 예외 메시지
    pub error: Option<String>,
    /// 완료 시각 (epoch 밀리초), 0이면 현재 시각
    pub ended_at: i64,
}

impl ObservedResponse {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// 전송 실패 (상태 0)
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: 0,
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_ended_at(mut self, ended_at: i64) -> Self {
        self.ended_at = ended_at;
        self
    }
}

/// 네트워크 캡처 플러그인
pub struct NetworkCapture {
    filter: RequestFilter,
    classifier: Classifier,
    sink: RwLock<Option<Arc<dyn MetricSink>>>,
    submitted: AtomicU64,
}

impl NetworkCapture {
    /// 레지스트리 이름
    pub const NAME: &'static str = "network";

    /// 옵션으로 생성 — 잘못된 정규식은 설정 에러
    pub fn new(options: NetworkCaptureOptions) -> Result<Self, CoreError> {
        let filter = RequestFilter::new(&options)?;
        Ok(Self {
            filter,
            classifier: Classifier::new(options),
            sink: RwLock::new(None),
            submitted: AtomicU64::new(0),
        })
    }

    pub fn with_business_code_parser(mut self, parser: Arc<dyn BusinessCodeParser>) -> Self {
        self.classifier = self.classifier.with_parser(parser);
        self
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.filter = self.filter.with_sampler(sampler);
        self
    }

    pub fn options(&self) -> &NetworkCaptureOptions {
        self.classifier.options()
    }

    pub fn is_installed(&self) -> bool {
        self.sink.read().is_some()
    }

    /// 싱크가 수락한 API 메트릭 수
    ///
    /// 싱크 쪽 샘플링에서 버려진 메트릭도 포함한다.
    pub fn submitted_count(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    fn current_sink(&self) -> Option<Arc<dyn MetricSink>> {
        self.sink.read().clone()
    }

    /// 요청 전송 직전 훅
    ///
    /// 수집 대상이 아니면 `None`. trace 상관관계가 켜져 있고 페이지와
    /// same-origin이면 `request.headers`에 trace id를 주입한다.
    pub fn prepare(&self, request: &mut OutgoingRequest) -> Option<RequestTicket> {
        let sink = self.current_sink()?;
        let config = sink.config_snapshot();

        if !self
            .filter
            .should_capture(&request.url, config.report_url.as_deref())
        {
            return None;
        }

        let options = self.classifier.options();
        let trace_id = if options.enable_trace_correlation
            && is_same_origin(&request.url, config.page_url.as_deref())
        {
            attach_trace_id(&mut request.headers, &options.trace_header_name)
        } else {
            None
        };

        Some(RequestTicket {
            url: request.url.clone(),
            method: request.method.clone(),
            started_at: ids::now_ms(),
            request_body: request.body.clone(),
            source: request.source,
            trace_id,
        })
    }

    /// 응답 수신 후 훅 — 메트릭을 제출했으면 `true`
    pub async fn complete(&self, ticket: RequestTicket, response: ObservedResponse) -> bool {
        let ended_at = if response.ended_at == 0 {
            ids::now_ms()
        } else {
            response.ended_at
        };
        let exchange = RawExchange {
            url: ticket.url,
            method: ticket.method,
            status: response.status,
            started_at: ticket.started_at,
            ended_at,
            request_body: ticket.request_body,
            response_body: response.body,
            response_headers: response.headers,
            error: response.error,
            source: ticket.source,
            trace_id: ticket.trace_id,
        };
        self.report(exchange).await
    }

    /// 완료된 교환을 한 번에 관측
    pub async fn observe(&self, exchange: RawExchange) -> bool {
        let Some(sink) = self.current_sink() else {
            return false;
        };
        let report_url = sink.config_snapshot().report_url;
        if !self
            .filter
            .should_capture(&exchange.url, report_url.as_deref())
        {
            return false;
        }
        self.report(exchange).await
    }

    async fn report(&self, exchange: RawExchange) -> bool {
        let Some(sink) = self.current_sink() else {
            debug!("캡처 어댑터 해제됨 — 응답 무시: {}", exchange.url);
            return false;
        };
        let Some(record) = self.classifier.classify(&exchange) else {
            return false;
        };

        match sink.submit(vec![record.into_metric()], false).await {
            Ok(()) => {
                self.submitted.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                warn!("API 메트릭 제출 실패: {e}");
                false
            }
        }
    }
}

impl Plugin for NetworkCapture {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn setup(&self, sink: Arc<dyn MetricSink>) -> Result<(), CoreError> {
        let mut slot = self.sink.write();
        if slot.is_some() {
            return Err(CoreError::Usage(
                "네트워크 캡처가 이미 설치되어 있습니다".to_string(),
            ));
        }
        *slot = Some(sink);
        info!("네트워크 캡처 설치");
        Ok(())
    }

    fn teardown(&self) -> Result<(), CoreError> {
        if self.sink.write().take().is_some() {
            info!("네트워크 캡처 해제");
        }
        Ok(())
    }
}
