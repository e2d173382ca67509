//! 블로킹 HTTP 요청 전송.
//!
//! `RequestTransport` 포트 구현. 메트릭 배치(JSON 배열)를 수집 엔드포인트로 POST하고
//! 응답 상태로 성공 여부를 판정한다. 재시도는 하지 않는다 — 실패한 배치는
//! 트래커가 재큐잉한다.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};
use webtrack_core::error::CoreError;
use webtrack_core::ports::transport::RequestTransport;

/// 기본 요청 타임아웃
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// 에러 메시지에 포함할 응답 본문 최대 길이
const MAX_ERROR_BODY_LEN: usize = 512;

/// 수집 엔드포인트 HTTP 클라이언트 — `RequestTransport` 포트 구현
pub struct HttpRequestTransport {
    client: reqwest::Client,
}

impl HttpRequestTransport {
    /// 새 HTTP 전송 생성
    pub fn new(timeout: Duration) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {}", e)))?;

        Ok(Self { client })
    }

    /// 기존 클라이언트 재사용
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// 응답 상태 코드 확인 및 에러 매핑
    async fn check_response(resp: reqwest::Response) -> Result<(), CoreError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let mut body = resp.text().await.unwrap_or_else(|e| {
            warn!("응답 본문 읽기 실패: {e}");
            String::new()
        });
        if body.len() > MAX_ERROR_BODY_LEN {
            let cut = (0..=MAX_ERROR_BODY_LEN)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }

        Err(CoreError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

/// 커스텀 헤더를 reqwest 헤더 맵으로 변환 (잘못된 헤더는 경고 후 무시)
pub(crate) fn build_headers(headers: &BTreeMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!("잘못된 커스텀 헤더 무시: {name}"),
        }
    }
    map
}

#[async_trait]
impl RequestTransport for HttpRequestTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: String,
    ) -> Result<(), CoreError> {
        debug!("메트릭 배치 POST: {} bytes → {url}", body.len());

        let mut header_map = build_headers(headers);
        header_map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = self
            .client
            .post(url)
            .headers(header_map)
            .body(body)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("메트릭 전송 요청 실패: {e}")))?;

        Self::check_response(resp).await?;
        debug!("메트릭 배치 전송 성공");
        Ok(())
    }
}
