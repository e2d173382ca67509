//! 메트릭 모델.
//!
//! 수집 서버로 전송되는 단일 관측 단위. 공통 컨텍스트 필드 + 종류별 데이터로 구성되며
//! JSON 배열로 직렬화되어 전송된다 (`type` 태그, camelCase).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::exchange::SourceKind;

/// 메트릭 종류 (로그/통계용 태그)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    JsError,
    Api,
    Resource,
    Performance,
    PageView,
    Custom,
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MetricKind::JsError => "jsError",
            MetricKind::Api => "api",
            MetricKind::Resource => "resource",
            MetricKind::Performance => "performance",
            MetricKind::PageView => "pageView",
            MetricKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// 종류별 메트릭 데이터
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MetricData {
    /// 스크립트 에러
    JsError(JsErrorMetric),
    /// API 호출 (fetch/xhr)
    Api(ApiMetric),
    /// 리소스 로딩
    Resource(ResourceMetric),
    /// 성능 지표 (web-vitals 등 외부 계산값)
    Performance(PerformanceMetric),
    /// 페이지 뷰
    PageView(PageViewMetric),
    /// 사용자 정의 이벤트
    Custom(CustomMetric),
}

/// 스크립트 에러 메트릭
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsErrorMetric {
    pub message: String,
    /// 에러 타입 이름 (예: "TypeError")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lineno: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colno: Option<u32>,
}

/// API 호출 메트릭 — 분류기(classifier) 출력이 변환되어 들어온다
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMetric {
    pub url: String,
    pub method: String,
    /// HTTP 상태 코드 (0 = 네트워크 레벨 실패)
    pub status: u16,
    /// 소요 시간 (밀리초)
    pub duration: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// 응답 본문에서 추출한 비즈니스 상태 코드
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub source: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_body: Option<serde_json::Value>,
}

/// 리소스 로딩 메트릭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetric {
    pub url: String,
    /// 로딩 주체 (script, img, link ...)
    pub initiator_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_size: Option<u64>,
    pub success: bool,
}

/// 성능 지표 메트릭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetric {
    /// 지표 이름 (예: "LCP", "CLS")
    pub name: String,
    pub value: f64,
    /// 등급 ("good" / "needs-improvement" / "poor")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
}

/// 페이지 뷰 메트릭
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageViewMetric {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// 사용자 정의 메트릭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMetric {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// 디바이스 정보
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// 화면 해상도 (예: "1920x1080")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen: Option<String>,
}

/// 단일 메트릭 — 공통 컨텍스트 + 종류별 데이터
///
/// 컨텍스트 필드는 소스가 비워 두면 트래커가 보강(enrichment)한다.
/// 소스가 이미 채운 값은 덮어쓰지 않는다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    #[serde(flatten)]
    pub data: MetricData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// 발생 시각 (epoch 밀리초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, serde_json::Value>,
}

impl Metric {
    /// 컨텍스트가 비어 있는 메트릭 생성
    pub fn new(data: MetricData) -> Self {
        Self {
            data,
            project: None,
            app_version: None,
            timestamp: None,
            session_id: None,
            page_url: None,
            user_id: None,
            device: None,
            tags: BTreeMap::new(),
        }
    }

    pub fn js_error(message: impl Into<String>) -> Self {
        Self::new(MetricData::JsError(JsErrorMetric {
            message: message.into(),
            ..Default::default()
        }))
    }

    pub fn page_view() -> Self {
        Self::new(MetricData::PageView(PageViewMetric::default()))
    }

    pub fn performance(name: impl Into<String>, value: f64) -> Self {
        Self::new(MetricData::Performance(PerformanceMetric {
            name: name.into(),
            value,
            rating: None,
        }))
    }

    pub fn custom(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self::new(MetricData::Custom(CustomMetric {
            name: name.into(),
            payload,
        }))
    }

    /// 발생 시각 지정 (소스가 자체 타임스탬프를 가진 경우)
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// 태그 추가
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 메트릭 종류
    pub fn kind(&self) -> MetricKind {
        match &self.data {
            MetricData::JsError(_) => MetricKind::JsError,
            MetricData::Api(_) => MetricKind::Api,
            MetricData::Resource(_) => MetricKind::Resource,
            MetricData::Performance(_) => MetricKind::Performance,
            MetricData::PageView(_) => MetricKind::PageView,
            MetricData::Custom(_) => MetricKind::Custom,
        }
    }
}

impl From<ApiMetric> for Metric {
    fn from(api: ApiMetric) -> Self {
        Self::new(MetricData::Api(api))
    }
}

impl From<ResourceMetric> for Metric {
    fn from(resource: ResourceMetric) -> Self {
        Self::new(MetricData::Resource(resource))
    }
}

impl From<JsErrorMetric> for Metric {
    fn from(error: JsErrorMetric) -> Self {
        Self::new(MetricData::JsError(error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_type_tag_and_camel_case() {
        let metric = Metric::custom("checkout", serde_json::json!({"step": 2}))
            .with_timestamp(1_700_000_000_000)
            .with_tag("plan", "pro");
        let json = serde_json::to_value(&metric).unwrap();

        assert_eq!(json["type"], "custom");
        assert_eq!(json["name"], "checkout");
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
        assert_eq!(json["tags"]["plan"], "pro");
        // 비어 있는 컨텍스트는 생략
        assert!(json.get("sessionId").is_none());
        assert!(json.get("userId").is_none());
    }

    #[test]
    fn api_metric_wire_shape() {
        let metric: Metric = ApiMetric {
            url: "https://example.com/api".to_string(),
            method: "POST".to_string(),
            status: 500,
            duration: 120,
            success: false,
            error_message: Some("HTTP 500".to_string()),
            business_code: None,
            trace_id: Some("abc".to_string()),
            source: SourceKind::Fetch,
            request_body: None,
            response_body: None,
        }
        .into();

        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["type"], "api");
        assert_eq!(json["errorMessage"], "HTTP 500");
        assert_eq!(json["traceId"], "abc");
        assert_eq!(json["source"], "fetch");
        assert!(json.get("businessCode").is_none());
        assert_eq!(metric.kind(), MetricKind::Api);
    }

    #[test]
    fn metric_json_roundtrip() {
        let metric = Metric::js_error("boom").with_timestamp(42);
        let json = serde_json::to_string(&metric).unwrap();
        let decoded: Metric = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, metric);
    }

    #[test]
    fn kind_display_matches_wire_tag() {
        let metric = Metric::page_view();
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(json["type"], metric.kind().to_string());
    }
}
