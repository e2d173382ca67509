//! # webtrack-network
//!
//! 메트릭 전송 어댑터.
//! 수집 엔드포인트로의 배치 전송을 담당하며, beacon → request → pixel
//! 폴백 체인과 블로킹 전송 상호 배제를 제공한다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use webtrack_network::http_client::DEFAULT_TIMEOUT;
//! use webtrack_network::reporter::Reporter;
//! use webtrack_core::ports::reporter::ReporterConfig;
//!
//! let reporter = Reporter::new(ReporterConfig::default(), DEFAULT_TIMEOUT)?;
//! ```

pub mod beacon;
pub mod http_client;
pub mod pixel;
pub mod reporter;
