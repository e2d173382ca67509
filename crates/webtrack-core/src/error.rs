//! WEBTRACK 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 `CoreError`를 그대로 반환하거나 로그로 소비한다.
//! 호스트 애플리케이션으로 전파되는 것은 설정 에러와 사용 에러뿐이다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류 (필수 값 누락, 잘못된 정규식 등)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 사용 에러 (파기된 인스턴스 호출 등). 호출은 no-op으로 처리된다.
    #[error("사용 에러: {0}")]
    Usage(String),

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 수집 서버가 2xx가 아닌 응답을 반환
    #[error("HTTP 에러 ({status}): {body}")]
    Http {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문 (일부)
        body: String,
    },

    /// 블로킹 전송이 이미 진행 중 — 배치는 호출자가 재큐잉해야 한다
    #[error("블로킹 전송이 이미 진행 중")]
    DeliveryInFlight,

    /// 사용자 훅(beforeSend, 비즈니스 코드 파서) 실패
    #[error("훅 실패: {0}")]
    Hook(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_message_contains_status() {
        let err = CoreError::Http {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
    }
}
