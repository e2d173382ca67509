//! 식별자 생성.
//!
//! 세션 ID와 trace id는 모두 "시각 + 난수" 조합이다.

/// 현재 시각 (epoch 밀리초)
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 세션 ID 생성 — `<ms 타임스탬프 hex>-<64bit 난수 hex>`
pub fn new_session_id() -> String {
    format!("{:x}-{:016x}", now_ms(), rand::random::<u64>())
}

/// trace id 생성 — 시각 hex 뒤에 16자리 난수 hex를 붙인다
pub fn new_trace_id() -> String {
    format!("{:x}{:016x}", now_ms(), rand::random::<u64>())
}
