//! 요청 필터.
//!
//! 비용이 낮은 검사부터 순서대로 적용하고 첫 번째 일치에서 중단한다.
//! 1. 수집 엔드포인트 자체로 가는 요청 (자기 보고 루프 방지)
//! 2. 허용 목록 정규식 불일치
//! 3. 차단 목록 정규식 일치
//! 4. 확률적 샘플링 (`random() > sample`이면 드롭)

use regex::Regex;
use std::sync::Arc;
use tracing::trace;
use url::Url;
use webtrack_core::config::NetworkCaptureOptions;
use webtrack_core::error::CoreError;
use webtrack_core::ports::sampler::{RandomSampler, Sampler};

/// 요청 드롭 사유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    SelfReport,
    NotAllowed,
    Blocked,
    Sampled,
}

/// 네트워크 요청 필터 — 설정 기반 필터링 + 샘플링
pub struct RequestFilter {
    ignore_self_report: bool,
    allow: Option<Regex>,
    block: Vec<Regex>,
    sample: f64,
    sampler: Arc<dyn Sampler>,
}

impl RequestFilter {
    /// 새 필터 생성 — 잘못된 정규식은 설정 에러
    pub fn new(options: &NetworkCaptureOptions) -> Result<Self, CoreError> {
        let allow = options
            .resource_allow_regex
            .as_deref()
            .map(compile)
            .transpose()?;
        let block = options
            .filter_urls
            .iter()
            .map(|p| compile(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            ignore_self_report: options.ignore_self_report_requests,
            allow,
            block,
            sample: options.sample,
            sampler: Arc::new(RandomSampler),
        })
    }

    /// 샘플러 교체
    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// 요청 검사 — 드롭이면 사유 반환
    ///
    /// `report_url`은 런타임에 바뀔 수 있으므로 호출 시점 값을 받는다.
    pub fn check(&self, url: &str, report_url: Option<&str>) -> Result<(), DropReason> {
        if self.ignore_self_report {
            if let Some(endpoint) = report_url {
                if is_self_report(url, endpoint) {
                    return Err(DropReason::SelfReport);
                }
            }
        }

        if let Some(allow) = &self.allow {
            if !allow.is_match(url) {
                return Err(DropReason::NotAllowed);
            }
        }

        if self.block.iter().any(|re| re.is_match(url)) {
            return Err(DropReason::Blocked);
        }

        if !self.sampler.keep(self.sample) {
            return Err(DropReason::Sampled);
        }

        Ok(())
    }

    /// 수집 대상인지 확인
    pub fn should_capture(&self, url: &str, report_url: Option<&str>) -> bool {
        match self.check(url, report_url) {
            Ok(()) => true,
            Err(reason) => {
                trace!("요청 제외 ({reason:?}): {url}");
                false
            }
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, CoreError> {
    Regex::new(pattern)
        .map_err(|e| CoreError::Config(format!("잘못된 URL 정규식 '{pattern}': {e}")))
}

/// 쿼리/프래그먼트를 제외한 URL
fn base_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// `path`가 엔드포인트 경로 자체이거나 그 하위 경로인지
fn is_under(path: &str, endpoint_path: &str) -> bool {
    match path.strip_prefix(endpoint_path) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || endpoint_path.ends_with('/'),
        None => false,
    }
}

/// 요청 URL이 수집 엔드포인트를 향하는지
///
/// 둘 다 절대 URL이면 origin과 경로로 비교하고, 아니면 쿼리를 뗀 문자열로 비교한다.
fn is_self_report(url: &str, endpoint: &str) -> bool {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return false;
    }
    match (Url::parse(url), Url::parse(endpoint)) {
        (Ok(request), Ok(endpoint)) => {
            request.origin() == endpoint.origin() && is_under(request.path(), endpoint.path())
        }
        _ => is_under(base_of(url), base_of(endpoint)),
    }
}
