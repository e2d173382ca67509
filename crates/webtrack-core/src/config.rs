//! 트래커 설정 구조체.
//!
//! 프로젝트 ID, 샘플링, 버퍼 용량, 수집 엔드포인트 등 런타임 설정과
//! 네트워크 캡처 어댑터 옵션을 정의한다. JSON 키는 camelCase.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::models::metric::DeviceInfo;

// ============================================================
// 트래커 설정
// ============================================================

/// 트래커(버퍼 컨트롤러) 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// 프로젝트 ID (필수)
    #[serde(default)]
    pub project: String,
    /// 앱 버전
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// 수집 엔드포인트 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    /// send 호출 단위 샘플링 비율 (0.0 ~ 1.0)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: f64,
    /// 디버그 로깅
    #[serde(default)]
    pub debug: bool,
    /// 최대 버퍼 용량 — 도달 시 자동 flush
    #[serde(default = "default_max_cache")]
    pub max_cache: usize,
    /// 항상 블로킹 전송 사용
    #[serde(default)]
    pub report_immediately: bool,
    /// 수집 요청에 병합할 커스텀 헤더
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// 기본 페이지 URL (메트릭에 없을 때 보강)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    /// 사용자 ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// 디바이스 정보
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceInfo>,
}

impl TrackerConfig {
    /// 기본값으로 설정 생성
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            app_version: None,
            report_url: None,
            sample_rate: default_sample_rate(),
            debug: false,
            max_cache: default_max_cache(),
            report_immediately: false,
            headers: BTreeMap::new(),
            page_url: None,
            user_id: None,
            device: None,
        }
    }

    pub fn with_report_url(mut self, url: impl Into<String>) -> Self {
        self.report_url = Some(url.into());
        self
    }

    pub fn with_app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = Some(version.into());
        self
    }

    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn with_max_cache(mut self, max_cache: usize) -> Self {
        self.max_cache = max_cache;
        self
    }

    pub fn with_page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = Some(url.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_report_immediately(mut self, enabled: bool) -> Self {
        self.report_immediately = enabled;
        self
    }

    /// 설정 유효성 검증
    ///
    /// 프로젝트 ID 누락은 생성 단계의 치명적 에러로 취급한다.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.project.trim().is_empty() {
            return Err(CoreError::Config("project는 필수 설정입니다".to_string()));
        }
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(CoreError::Validation {
                field: "sampleRate".to_string(),
                message: format!("0과 1 사이여야 합니다: {}", self.sample_rate),
            });
        }
        if self.max_cache == 0 {
            return Err(CoreError::Validation {
                field: "maxCache".to_string(),
                message: "1 이상이어야 합니다".to_string(),
            });
        }
        Ok(())
    }
}

/// 런타임 부분 설정 변경 (None 필드는 유지)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub report_url: Option<String>,
    #[serde(default)]
    pub sample_rate: Option<f64>,
    #[serde(default)]
    pub debug: Option<bool>,
    #[serde(default)]
    pub max_cache: Option<usize>,
    #[serde(default)]
    pub report_immediately: Option<bool>,
    /// 기존 헤더에 병합된다
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceInfo>,
}

impl ConfigPatch {
    /// 현재 설정에 병합한 새 설정 반환 (원본은 변경하지 않음)
    pub fn merged_into(&self, current: &TrackerConfig) -> TrackerConfig {
        let mut next = current.clone();
        if let Some(v) = &self.app_version {
            next.app_version = Some(v.clone());
        }
        if let Some(v) = &self.report_url {
            next.report_url = Some(v.clone());
        }
        if let Some(v) = self.sample_rate {
            next.sample_rate = v;
        }
        if let Some(v) = self.debug {
            next.debug = v;
        }
        if let Some(v) = self.max_cache {
            next.max_cache = v;
        }
        if let Some(v) = self.report_immediately {
            next.report_immediately = v;
        }
        if let Some(headers) = &self.headers {
            next.headers
                .extend(headers.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        if let Some(v) = &self.page_url {
            next.page_url = Some(v.clone());
        }
        if let Some(v) = &self.user_id {
            next.user_id = Some(v.clone());
        }
        if let Some(v) = &self.device {
            next.device = Some(v.clone());
        }
        next
    }
}

// ============================================================
// 네트워크 캡처 설정
// ============================================================

/// 네트워크 캡처 어댑터 옵션 — 요청 필터링/분류 정책
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkCaptureOptions {
    /// 수집 엔드포인트 자체로 가는 요청 무시 (자기 보고 루프 방지)
    #[serde(default = "default_true")]
    pub ignore_self_report_requests: bool,
    /// 차단 목록 정규식
    #[serde(default)]
    pub filter_urls: Vec<String>,
    /// 허용 목록 정규식 (설정 시 일치하는 URL만 수집)
    #[serde(default)]
    pub resource_allow_regex: Option<String>,
    #[serde(default)]
    pub include_request_body: bool,
    #[serde(default)]
    pub include_response_body: bool,
    /// 본문 캡처 최대 길이 (문자 수)
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
    /// 요청 단위 샘플링 비율
    #[serde(default = "default_sample_rate")]
    pub sample: f64,
    #[serde(default)]
    pub enable_duration_check: bool,
    /// 타임아웃 판정 임계값 (밀리초)
    #[serde(default = "default_duration_threshold_ms")]
    pub duration_threshold_ms: u64,
    #[serde(default)]
    pub enable_trace_correlation: bool,
    /// trace id를 주입할 요청 헤더 이름
    #[serde(default = "default_trace_header_name")]
    pub trace_header_name: String,
    /// 크롤러 차단 응답(403 + 마커 헤더) 제외
    #[serde(default = "default_true")]
    pub ignore_forbidden_responses: bool,
    /// 크롤러 차단 마커 헤더 이름
    #[serde(default = "default_forbidden_marker_header")]
    pub forbidden_marker_header: String,
    #[serde(default)]
    pub auto_extract_business_code: bool,
}

impl Default for NetworkCaptureOptions {
    fn default() -> Self {
        Self {
            ignore_self_report_requests: true,
            filter_urls: Vec::new(),
            resource_allow_regex: None,
            include_request_body: false,
            include_response_body: false,
            max_content_length: default_max_content_length(),
            sample: default_sample_rate(),
            enable_duration_check: false,
            duration_threshold_ms: default_duration_threshold_ms(),
            enable_trace_correlation: false,
            trace_header_name: default_trace_header_name(),
            ignore_forbidden_responses: true,
            forbidden_marker_header: default_forbidden_marker_header(),
            auto_extract_business_code: false,
        }
    }
}

// ============================================================
// 기본값 함수
// ============================================================

fn default_true() -> bool {
    true
}
fn default_sample_rate() -> f64 {
    1.0
}
fn default_max_cache() -> usize {
    50
}
fn default_max_content_length() -> usize {
    10_000
}
fn default_duration_threshold_ms() -> u64 {
    2_000
}
fn default_trace_header_name() -> String {
    "x-trace-id".to_string()
}
fn default_forbidden_marker_header() -> String {
    "x-forbidden-reason".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_defaults() {
        let config = TrackerConfig::new("proj");
        assert_eq!(config.sample_rate, 1.0);
        assert_eq!(config.max_cache, 50);
        assert!(!config.report_immediately);
        assert!(!config.debug);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_project_is_config_error() {
        let config: TrackerConfig = serde_json::from_str(r#"{"reportUrl":"https://c"}"#).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn sample_rate_out_of_range_rejected() {
        let err = TrackerConfig::new("p")
            .with_sample_rate(1.5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { ref field, .. } if field == "sampleRate"));
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(TrackerConfig::new("p").with_max_cache(0).validate().is_err());
    }

    #[test]
    fn deserializes_camel_case_keys() {
        let config: TrackerConfig = serde_json::from_str(
            r#"{"project":"p1","appVersion":"1.2.0","maxCache":10,"reportImmediately":true,"headers":{"x-app":"web"}}"#,
        )
        .unwrap();
        assert_eq!(config.app_version.as_deref(), Some("1.2.0"));
        assert_eq!(config.max_cache, 10);
        assert!(config.report_immediately);
        assert_eq!(config.headers.get("x-app").map(String::as_str), Some("web"));
        assert_eq!(config.sample_rate, 1.0);
    }

    #[test]
    fn patch_merges_headers_and_keeps_unset_fields() {
        let base = TrackerConfig::new("p")
            .with_report_url("https://a/collect")
            .with_header("x-a", "1");
        let mut headers = BTreeMap::new();
        headers.insert("x-b".to_string(), "2".to_string());
        let patch = ConfigPatch {
            sample_rate: Some(0.5),
            headers: Some(headers),
            ..Default::default()
        };

        let next = patch.merged_into(&base);
        assert_eq!(next.sample_rate, 0.5);
        assert_eq!(next.report_url.as_deref(), Some("https://a/collect"));
        assert_eq!(next.headers.len(), 2);
        assert_eq!(base.sample_rate, 1.0);
    }

    #[test]
    fn network_options_defaults() {
        let options: NetworkCaptureOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, NetworkCaptureOptions::default());
        assert!(options.ignore_self_report_requests);
        assert!(options.ignore_forbidden_responses);
        assert_eq!(options.max_content_length, 10_000);
        assert_eq!(options.duration_threshold_ms, 2_000);
        assert_eq!(options.sample, 1.0);
        assert!(!options.enable_duration_check);
    }
}
