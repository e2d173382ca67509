//! 네트워크 교환(exchange) 모델.
//!
//! 캡처 어댑터가 관측한 원시 요청/응답과, 분류기가 생성하는 분류 레코드.
//! 분류 레코드는 저장되지 않고 즉시 API 메트릭으로 변환된다.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::metric::{ApiMetric, Metric};

/// 요청 발생 소스
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Fetch,
    Xhr,
}

/// 요청/응답 본문 — 캡처 어댑터가 관측한 형태 그대로
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// 텍스트 본문 (JSON 문자열 포함)
    Text(String),
    /// 이미 파싱된 JSON
    Json(serde_json::Value),
    /// 폼 데이터 (필드 수만 기록)
    FormData { fields: usize },
    /// 바이너리 blob (크기만 기록)
    Blob { size: u64 },
}

/// 어댑터가 관측한 원시 네트워크 교환
#[derive(Debug, Clone, Default)]
pub struct RawExchange {
    pub url: String,
    pub method: String,
    /// HTTP 상태 코드 (0 = 전송 레벨 실패)
    pub status: u16,
    /// 요청 시작 시각 (epoch 밀리초)
    pub started_at: i64,
    /// 응답 완료 시각 (epoch 밀리초)
    pub ended_at: i64,
    pub request_body: Option<Body>,
    pub response_body: Option<Body>,
    /// 응답 헤더 (키는 소문자)
    pub response_headers: HashMap<String, String>,
    /// 전송 레벨 예외 메시지
    pub error: Option<String>,
    pub source: SourceKind,
    /// 요청 전에 주입된 trace id
    pub trace_id: Option<String>,
}

impl RawExchange {
    /// 소요 시간 (밀리초, 음수는 0으로 보정)
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.ended_at - self.started_at).unwrap_or(0)
    }

    /// 응답 헤더 조회 (대소문자 무시)
    pub fn response_header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.response_headers
            .iter()
            .find(|(k, _)| k.to_ascii_lowercase() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// 요청 분류 레코드 — 분류기 출력
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    pub url: String,
    pub method: String,
    pub status: u16,
    pub duration: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub business_code: Option<String>,
    pub trace_id: Option<String>,
    pub source: SourceKind,
    pub request_body: Option<serde_json::Value>,
    pub response_body: Option<serde_json::Value>,
}

impl RequestRecord {
    /// API 메트릭으로 변환
    pub fn into_metric(self) -> Metric {
        Metric::from(ApiMetric {
            url: self.url,
            method: self.method,
            status: self.status,
            duration: self.duration,
            success: self.success,
            error_message: self.error_message,
            business_code: self.business_code,
            trace_id: self.trace_id,
            source: self.source,
            request_body: self.request_body,
            response_body: self.response_body,
        })
    }
}
