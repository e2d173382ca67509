//! 요청 분류기.
//!
//! 관측된 네트워크 교환 하나를 분류 레코드로 변환한다. 상태를 갖지 않으며
//! 입력과 설정만으로 결과가 결정된다.
//!
//! 판정 순서:
//! 1. 크롤러 차단 응답(403 + 마커 헤더) → 레코드 없음
//! 2. 상태 코드 기반 성공 판정 (`[200, 400)`, 0 = 네트워크 실패)
//! 3. 소요 시간 임계값 초과 → 상태와 무관하게 실패 (메시지 덮어씀)
//! 4. 비즈니스 코드 추출 (파서 실패는 로그 후 없음으로 처리)
//! 5. 본문 캡처

use serde_json::Value;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};
use webtrack_core::config::NetworkCaptureOptions;
use webtrack_core::error::CoreError;
use webtrack_core::models::exchange::{RawExchange, RequestRecord};

use crate::content::{capture_body, parse_json};

/// 전송 레벨 실패 기본 메시지
pub const NETWORK_ERROR_MESSAGE: &str = "network error";

/// 응답 본문에서 비즈니스 상태 코드를 꺼내는 파서
pub trait BusinessCodeParser: Send + Sync {
    fn parse(&self, body: &Value) -> Result<Option<String>, CoreError>;
}

impl<F> BusinessCodeParser for F
where
    F: Fn(&Value) -> Result<Option<String>, CoreError> + Send + Sync,
{
    fn parse(&self, body: &Value) -> Result<Option<String>, CoreError> {
        self(body)
    }
}

/// 기본 파서 — `code`, `status`, `errcode` 순서로 찾는다
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBusinessCodeParser;

impl BusinessCodeParser for DefaultBusinessCodeParser {
    fn parse(&self, body: &Value) -> Result<Option<String>, CoreError> {
        let code = ["code", "status", "errcode"]
            .iter()
            .find_map(|key| body.get(key))
            .and_then(|value| match value {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            });
        Ok(code)
    }
}

/// 요청 분류기
pub struct Classifier {
    options: NetworkCaptureOptions,
    parser: Arc<dyn BusinessCodeParser>,
}

impl Classifier {
    pub fn new(options: NetworkCaptureOptions) -> Self {
        Self {
            options,
            parser: Arc::new(DefaultBusinessCodeParser),
        }
    }

    /// 사용자 정의 비즈니스 코드 파서
    pub fn with_parser(mut self, parser: Arc<dyn BusinessCodeParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn options(&self) -> &NetworkCaptureOptions {
        &self.options
    }

    /// 교환 하나를 분류 — 보고 대상이 아니면 `None`
    pub fn classify(&self, exchange: &RawExchange) -> Option<RequestRecord> {
        if self.options.ignore_forbidden_responses && self.is_forbidden(exchange) {
            debug!("크롤러 차단 응답 제외: {}", exchange.url);
            return None;
        }

        let duration = exchange.duration_ms();
        let (mut success, mut error_message) = status_outcome(exchange);

        if self.options.enable_duration_check && duration > self.options.duration_threshold_ms {
            success = false;
            error_message = Some(format!(
                "request exceeded duration threshold of {}ms (took {}ms)",
                self.options.duration_threshold_ms, duration
            ));
        }

        let business_code = if self.options.auto_extract_business_code {
            self.extract_business_code(exchange)
        } else {
            None
        };

        let max_len = self.options.max_content_length;
        let request_body = if self.options.include_request_body {
            exchange.request_body.as_ref().map(|b| capture_body(b, max_len))
        } else {
            None
        };
        let response_body = if self.options.include_response_body {
            exchange.response_body.as_ref().map(|b| capture_body(b, max_len))
        } else {
            None
        };

        Some(RequestRecord {
            url: exchange.url.clone(),
            method: exchange.method.to_ascii_uppercase(),
            status: exchange.status,
            duration,
            success,
            error_message,
            business_code,
            trace_id: exchange.trace_id.clone(),
            source: exchange.source,
            request_body,
            response_body,
        })
    }

    fn is_forbidden(&self, exchange: &RawExchange) -> bool {
        exchange.status == 403
            && exchange
                .response_header(&self.options.forbidden_marker_header)
                .is_some()
    }

    fn extract_business_code(&self, exchange: &RawExchange) -> Option<String> {
        let body = parse_json(exchange.response_body.as_ref()?)?;
        let parser = self.parser.clone();

        match catch_unwind(AssertUnwindSafe(|| parser.parse(&body))) {
            Ok(Ok(code)) => code,
            Ok(Err(e)) => {
                warn!("비즈니스 코드 파서 실패: {e}");
                None
            }
            Err(_) => {
                warn!("비즈니스 코드 파서 panic — 코드 없음으로 처리");
                None
            }
        }
    }
}

/// 상태 코드 기반 성공 판정
fn status_outcome(exchange: &RawExchange) -> (bool, Option<String>) {
    if exchange.status == 0 || exchange.error.is_some() {
        let message = exchange
            .error
            .clone()
            .unwrap_or_else(|| NETWORK_ERROR_MESSAGE.to_string());
        return (false, Some(message));
    }
    if (200..400).contains(&exchange.status) {
        (true, None)
    } else {
        (false, Some(format!("HTTP {}", exchange.status)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use webtrack_core::models::exchange::Body;

    fn exchange(status: u16, duration: i64) -> RawExchange {
        RawExchange {
            url: "https://api.example.com/orders".to_string(),
            method: "post".to_string(),
            status,
            started_at: 1_000,
            ended_at: 1_000 + duration,
            ..Default::default()
        }
    }

    fn options() -> NetworkCaptureOptions {
        NetworkCaptureOptions::default()
    }

    #[test]
    fn success_range() {
        let classifier = Classifier::new(options());
        let ok = classifier.classify(&exchange(204, 10)).unwrap();
        assert!(ok.success);
        assert!(ok.error_message.is_none());
        assert_eq!(ok.method, "POST");
        assert_eq!(ok.duration, 10);

        let redirect = classifier.classify(&exchange(302, 10)).unwrap();
        assert!(redirect.success);

        let failed = classifier.classify(&exchange(404, 10)).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.error_message.as_deref(), Some("HTTP 404"));
    }

    #[test]
    fn status_zero_is_network_failure() {
        let classifier = Classifier::new(options());
        let record = classifier.classify(&exchange(0, 5)).unwrap();
        assert!(!record.success);
        assert_eq!(record.error_message.as_deref(), Some(NETWORK_ERROR_MESSAGE));

        let mut aborted = exchange(0, 5);
        aborted.error = Some("connection reset".to_string());
        let record = classifier.classify(&aborted).unwrap();
        assert_eq!(record.error_message.as_deref(), Some("connection reset"));
    }

    #[test]
    fn duration_threshold_overrides_success() {
        let classifier = Classifier::new(NetworkCaptureOptions {
            enable_duration_check: true,
            duration_threshold_ms: 2_000,
            ..options()
        });
        let record = classifier.classify(&exchange(200, 2_500)).unwrap();
        assert!(!record.success);
        assert!(record.error_message.unwrap().contains("2000ms"));
    }

    #[test]
    fn duration_threshold_overrides_status_message() {
        let classifier = Classifier::new(NetworkCaptureOptions {
            enable_duration_check: true,
            ..options()
        });
        let record = classifier.classify(&exchange(500, 3_000)).unwrap();
        let message = record.error_message.unwrap();
        assert!(message.contains("threshold"));
        assert!(!message.contains("HTTP 500"));
    }

    #[test]
    fn duration_at_threshold_is_not_timeout() {
        let classifier = Classifier::new(NetworkCaptureOptions {
            enable_duration_check: true,
            ..options()
        });
        assert!(classifier.classify(&exchange(200, 2_000)).unwrap().success);
    }

    #[test]
    fn duration_check_disabled_by_default() {
        let classifier = Classifier::new(options());
        assert!(classifier.classify(&exchange(200, 60_000)).unwrap().success);
    }

    #[test]
    fn forbidden_marker_excludes_exchange() {
        let classifier = Classifier::new(options());
        let mut blocked = exchange(403, 10);
        blocked
            .response_headers
            .insert("x-forbidden-reason".to_string(), "crawler".to_string());
        assert!(classifier.classify(&blocked).is_none());

        // 마커 없는 403은 일반 실패
        let plain = classifier.classify(&exchange(403, 10)).unwrap();
        assert!(!plain.success);

        let keep = Classifier::new(NetworkCaptureOptions {
            ignore_forbidden_responses: false,
            ..options()
        });
        assert!(keep.classify(&blocked).is_some());
    }

    #[test]
    fn extracts_business_code_with_default_parser() {
        let classifier = Classifier::new(NetworkCaptureOptions {
            auto_extract_business_code: true,
            ..options()
        });
        let mut ex = exchange(200, 10);
        ex.response_body = Some(Body::Text(r#"{"code":10023,"msg":"expired"}"#.to_string()));
        let record = classifier.classify(&ex).unwrap();
        assert_eq!(record.business_code.as_deref(), Some("10023"));
        assert!(record.success);
    }

    #[test]
    fn business_code_disabled_or_non_json() {
        let mut ex = exchange(200, 10);
        ex.response_body = Some(Body::Json(json!({"code": "E1"})));
        assert!(Classifier::new(options())
            .classify(&ex)
            .unwrap()
            .business_code
            .is_none());

        let enabled = Classifier::new(NetworkCaptureOptions {
            auto_extract_business_code: true,
            ..options()
        });
        ex.response_body = Some(Body::Text("plain".to_string()));
        assert!(enabled.classify(&ex).unwrap().business_code.is_none());
    }

    #[test]
    fn custom_parser_errors_and_panics_are_contained() {
        let options = NetworkCaptureOptions {
            auto_extract_business_code: true,
            ..options()
        };
        let mut ex = exchange(200, 10);
        ex.response_body = Some(Body::Json(json!({"result": {"errNo": 7}})));

        let custom = Classifier::new(options.clone()).with_parser(Arc::new(
            |body: &Value| -> Result<Option<String>, CoreError> {
                Ok(body["result"]["errNo"].as_i64().map(|n| n.to_string()))
            },
        ));
        assert_eq!(custom.classify(&ex).unwrap().business_code.as_deref(), Some("7"));

        let failing = Classifier::new(options.clone()).with_parser(Arc::new(
            |_: &Value| -> Result<Option<String>, CoreError> {
                Err(CoreError::Hook("bad shape".to_string()))
            },
        ));
        let record = failing.classify(&ex).unwrap();
        assert!(record.business_code.is_none());
        assert!(record.success);

        let panicking = Classifier::new(options).with_parser(Arc::new(
            |_: &Value| -> Result<Option<String>, CoreError> { panic!("parser bug") },
        ));
        assert!(panicking.classify(&ex).unwrap().business_code.is_none());
    }

    #[test]
    fn captures_bodies_only_when_enabled() {
        let mut ex = exchange(200, 10);
        ex.request_body = Some(Body::FormData { fields: 2 });
        ex.response_body = Some(Body::Text(r#"{"ok":true}"#.to_string()));

        let off = Classifier::new(options()).classify(&ex).unwrap();
        assert!(off.request_body.is_none());
        assert!(off.response_body.is_none());

        let on = Classifier::new(NetworkCaptureOptions {
            include_request_body: true,
            include_response_body: true,
            ..options()
        })
        .classify(&ex)
        .unwrap();
        assert_eq!(on.request_body, Some(json!("[FormData] fields: 2")));
        assert_eq!(on.response_body, Some(json!({"ok": true})));
    }
}
