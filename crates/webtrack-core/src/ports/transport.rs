//! 전송 수단 포트.
//!
//! 구현: `webtrack-network` crate (reqwest 기반 beacon/request/pixel 클라이언트)

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::CoreError;

/// 논블로킹 beacon 전송
pub trait BeaconTransport: Send + Sync {
    /// 현재 환경에서 사용 가능한지
    fn is_available(&self) -> bool;

    /// 페이로드를 전송 큐에 넣는다. 큐잉에 실패하면 `false`.
    fn send_beacon(&self, url: &str, payload: Vec<u8>) -> bool;
}

/// 블로킹 HTTP 요청 전송
#[async_trait]
pub trait RequestTransport: Send + Sync {
    fn is_available(&self) -> bool {
        true
    }

    /// JSON 본문 POST — 2xx가 아니면 에러
    async fn post_json(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
        body: String,
    ) -> Result<(), CoreError>;
}

/// 최후 수단 픽셀 전송 — 전송 확인 없음
pub trait PixelTransport: Send + Sync {
    fn fire(&self, url: &str, payload: &str);
}
