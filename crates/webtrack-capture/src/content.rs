//! 요청/응답 본문 캡처.
//!
//! 본문을 최대 길이까지만 기록한다. 폼 데이터와 blob은 요약만 남기고,
//! JSON처럼 보이는 텍스트는 가능하면 파싱한다.

use serde_json::Value;
use webtrack_core::models::exchange::Body;

/// 잘린 텍스트 뒤에 붙는 표시
pub const TRUNCATION_MARKER: &str = "...";

/// 본문을 메트릭에 넣을 값으로 변환
pub fn capture_body(body: &Body, max_len: usize) -> Value {
    match body {
        Body::FormData { fields } => Value::String(format!("[FormData] fields: {fields}")),
        Body::Blob { size } => Value::String(format!("[Blob] size: {size}")),
        Body::Json(value) => {
            let text = value.to_string();
            if text.chars().count() <= max_len {
                value.clone()
            } else {
                Value::String(truncate(&text, max_len))
            }
        }
        Body::Text(text) => capture_text(text, max_len),
    }
}

fn capture_text(text: &str, max_len: usize) -> Value {
    if text.chars().count() > max_len {
        return Value::String(truncate(text, max_len));
    }
    if looks_like_json(text) {
        if let Ok(value) = serde_json::from_str::<Value>(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

/// 본문을 JSON으로 해석 (비즈니스 코드 추출용, 길이 제한 없음)
pub fn parse_json(body: &Body) -> Option<Value> {
    match body {
        Body::Json(value) => Some(value.clone()),
        Body::Text(text) if looks_like_json(text) => serde_json::from_str(text).ok(),
        _ => None,
    }
}

fn looks_like_json(text: &str) -> bool {
    let trimmed = text.trim_start();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// 문자 단위로 자르고 표시를 붙인다
fn truncate(text: &str, max_len: usize) -> String {
    let mut out: String = text.chars().take(max_len).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summarizes_structured_bodies() {
        assert_eq!(
            capture_body(&Body::Blob { size: 2048 }, 100),
            json!("[Blob] size: 2048")
        );
        assert_eq!(
            capture_body(&Body::FormData { fields: 3 }, 100),
            json!("[FormData] fields: 3")
        );
    }

    #[test]
    fn parses_json_text() {
        let value = capture_body(&Body::Text(r#"{"code":0,"data":[1,2]}"#.to_string()), 100);
        assert_eq!(value, json!({"code": 0, "data": [1, 2]}));
    }

    #[test]
    fn keeps_invalid_json_as_text() {
        let value = capture_body(&Body::Text("{not json".to_string()), 100);
        assert_eq!(value, json!("{not json"));
    }

    #[test]
    fn truncates_long_text_with_marker() {
        let value = capture_body(&Body::Text("가나다라마바사".to_string()), 3);
        assert_eq!(value, json!("가나다..."));
    }

    #[test]
    fn oversized_json_becomes_truncated_text() {
        let body = Body::Json(json!({"items": ["aaaaaaaaaa", "bbbbbbbbbb"]}));
        let value = capture_body(&body, 10);
        let text = value.as_str().unwrap();
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert_eq!(text.chars().count(), 10 + TRUNCATION_MARKER.len());
    }

    #[test]
    fn parse_json_ignores_plain_text() {
        assert!(parse_json(&Body::Text("ok".to_string())).is_none());
        assert_eq!(
            parse_json(&Body::Text(r#"{"code":"A1"}"#.to_string())),
            Some(json!({"code": "A1"}))
        );
        assert!(parse_json(&Body::Blob { size: 1 }).is_none());
    }
}
