//! 픽셀 전송 (최후 수단).
//!
//! `PixelTransport` 포트 구현. JSON 배치를 percent-encoding하여
//! `data` 쿼리 파라미터로 붙인 GET 요청을 보낸다. 결과는 확인하지 않는다.

use tracing::{debug, warn};
use webtrack_core::ports::transport::PixelTransport;

/// 픽셀 요청 URL 생성
///
/// 엔드포인트에 이미 쿼리가 있으면 `&`로 이어 붙인다.
pub fn pixel_url(endpoint: &str, payload: &str) -> String {
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!(
        "{endpoint}{separator}data={}",
        urlencoding::encode(payload)
    )
}

/// reqwest GET 기반 픽셀 전송
pub struct PixelClient {
    client: reqwest::Client,
}

impl PixelClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl PixelTransport for PixelClient {
    fn fire(&self, url: &str, payload: &str) {
        let target = pixel_url(url, payload);
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("픽셀 전송 불가: 런타임 없음");
            return;
        };

        let request = self.client.get(&target);
        handle.spawn(async move {
            if let Err(e) = request.send().await {
                debug!("픽셀 전송 실패 (무시): {e}");
            }
        });
    }
}
