//! Beacon 전송.
//!
//! `BeaconTransport` 포트 구현. 페이로드를 분리된 tokio 태스크로 넘기고 즉시 반환한다.
//! 호출자는 큐잉 성공 여부만 알 수 있고 전송 결과는 확인하지 않는다.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use tracing::{debug, warn};
use webtrack_core::ports::transport::BeaconTransport;

/// beacon 페이로드 상한 (64 KiB)
pub const MAX_BEACON_PAYLOAD: usize = 64 * 1024;

/// reqwest + tokio::spawn 기반 beacon
pub struct BeaconClient {
    client: reqwest::Client,
    max_payload: usize,
}

impl BeaconClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            max_payload: MAX_BEACON_PAYLOAD,
        }
    }

    /// 페이로드 상한 변경
    pub fn with_max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload;
        self
    }
}

impl BeaconTransport for BeaconClient {
    /// tokio 런타임 안에서만 사용 가능
    fn is_available(&self) -> bool {
        tokio::runtime::Handle::try_current().is_ok()
    }

    fn send_beacon(&self, url: &str, payload: Vec<u8>) -> bool {
        if payload.len() > self.max_payload {
            debug!(
                "beacon 페이로드 초과: {} > {} bytes",
                payload.len(),
                self.max_payload
            );
            return false;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return false;
        };

        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(payload);
        let url = url.to_string();

        handle.spawn(async move {
            match request.send().await {
                Ok(resp) if resp.status().is_success() => debug!("beacon 전송 완료: {url}"),
                Ok(resp) => warn!("beacon 응답 에러 ({}): {url}", resp.status()),
                Err(e) => warn!("beacon 전송 실패: {e}"),
            }
        });
        true
    }
}
