//! 플러그인(캡처 어댑터) 포트.
//!
//! 어댑터는 setup 시점에 가로채는 자원(전역 fetch 등)을 독점 획득하고
//! teardown 시점에 반환한다. 코어는 이름 기준 맵으로만 보관한다.

use std::sync::Arc;

use crate::error::CoreError;
use crate::ports::sink::MetricSink;

/// 캡처 어댑터 capability
pub trait Plugin: Send + Sync {
    /// 레지스트리 키 (트래커 내 고유)
    fn name(&self) -> &str;

    /// 어댑터 설치 — 관측 결과는 `sink`로 제출한다
    fn setup(&self, sink: Arc<dyn MetricSink>) -> Result<(), CoreError>;

    /// 어댑터 해제 — 실패해도 다른 어댑터의 해제를 막지 않는다
    fn teardown(&self) -> Result<(), CoreError>;
}
