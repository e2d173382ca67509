//! 로깅 초기화.

use tracing_subscriber::EnvFilter;

const DEBUG_FILTER: &str =
    "webtrack_core=debug,webtrack_capture=debug,webtrack_network=debug,webtrack_tracker=debug";

/// tracing 구독자 설치
///
/// `RUST_LOG`가 있으면 그대로 쓰고, 없으면 `debug`에 따라 WEBTRACK crate를
/// debug 레벨로 열거나 warn 이상만 남긴다. 이미 설치된 구독자가 있으면
/// 아무것도 하지 않고 `false`를 반환한다.
pub fn init(debug: bool) -> bool {
    let fallback = if debug { DEBUG_FILTER } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_is_harmless() {
        init(true);
        assert!(!init(false));
    }
}
