//! trace id 상관관계.
//!
//! 페이지와 same-origin인 요청에만 trace id를 생성해 요청 헤더에 주입한다.
//! 생성/주입 실패는 요청을 막지 않고 trace id 없음으로 처리한다.

use std::collections::BTreeMap;
use tracing::warn;
use url::Url;
use webtrack_core::ids;

/// same-origin 판정
///
/// 상대 URL은 페이지 URL 기준으로 해석한다. 페이지 URL이 없으면
/// 상대 URL만 same-origin으로 본다.
pub fn is_same_origin(request_url: &str, page_url: Option<&str>) -> bool {
    match page_url.and_then(|p| Url::parse(p).ok()) {
        Some(page) => match page.join(request_url) {
            Ok(resolved) => resolved.origin() == page.origin(),
            Err(_) => false,
        },
        None => matches!(
            Url::parse(request_url),
            Err(url::ParseError::RelativeUrlWithoutBase)
        ),
    }
}

/// HTTP 헤더 이름 토큰 문자 검사 (RFC 7230 tchar)
fn is_valid_header_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

/// trace id 생성 후 헤더 주입
///
/// 헤더 이름이 유효하지 않으면 경고만 남기고 `None`.
pub fn attach_trace_id(
    headers: &mut BTreeMap<String, String>,
    header_name: &str,
) -> Option<String> {
    if !is_valid_header_name(header_name) {
        warn!("잘못된 trace 헤더 이름 — trace id 생략: {header_name:?}");
        return None;
    }
    let trace_id = ids::new_trace_id();
    headers.insert(header_name.to_ascii_lowercase(), trace_id.clone());
    Some(trace_id)
}
