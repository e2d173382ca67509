//! 트래커 (버퍼 컨트롤러).
//!
//! 설정, 세션, 플러그인 레지스트리, 메트릭 버퍼를 소유하고 flush 시점을 결정한다.
//!
//! 흐름: `send` → 샘플링 → beforeSend 훅 → 보강 → 버퍼 추가
//! → (immediate 또는 용량 도달 시) `flush` → 리포터 전송 → 실패 시 재병합.
//!
//! 버퍼 잠금은 `.await` 너머로 유지하지 않는다. flush는 버퍼를 한 번에
//! 빈 버퍼와 교환하므로 재진입 flush가 같은 메트릭을 중복 전송하지 않는다.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use webtrack_core::config::{ConfigPatch, TrackerConfig};
use webtrack_core::config_manager::ConfigManager;
use webtrack_core::error::CoreError;
use webtrack_core::ids;
use webtrack_core::models::metric::Metric;
use webtrack_core::ports::plugin::Plugin;
use webtrack_core::ports::reporter::{DeliveryOutcome, MetricReporter, ReporterConfig};
use webtrack_core::ports::sampler::{RandomSampler, Sampler};
use webtrack_core::ports::sink::MetricSink;
use webtrack_network::http_client::DEFAULT_TIMEOUT;
use webtrack_network::reporter::Reporter;

use crate::logging;
use crate::merge::merge_failed;

/// 버퍼 추가 직전 메트릭 가공 훅
///
/// `Ok(None)`이면 해당 메트릭을 버린다. 에러나 panic은 로그만 남기고
/// 원본 메트릭을 그대로 유지한다.
pub trait BeforeSend: Send + Sync {
    fn before_send(&self, metric: Metric) -> Result<Option<Metric>, CoreError>;
}

impl<F> BeforeSend for F
where
    F: Fn(Metric) -> Result<Option<Metric>, CoreError> + Send + Sync,
{
    fn before_send(&self, metric: Metric) -> Result<Option<Metric>, CoreError> {
        self(metric)
    }
}

/// 트래커 통계
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerStats {
    /// 현재 버퍼 길이
    pub buffered: usize,
    /// 버퍼 용량 (maxCache)
    pub capacity: usize,
    pub session_id: String,
    /// 리포터에 배치를 넘긴 횟수
    pub flushes: u64,
    /// 재큐잉된 전송 실패 횟수
    pub failed_deliveries: u64,
    /// 샘플링으로 버려진 send 호출 수
    pub sampled_out: u64,
}

/// 트래커 빌더
pub struct TrackerBuilder {
    config: TrackerConfig,
    reporter: Option<Arc<dyn MetricReporter>>,
    sampler: Arc<dyn Sampler>,
    before_send: Option<Arc<dyn BeforeSend>>,
    timeout: Duration,
}

impl TrackerBuilder {
    /// 리포터 주입 (기본: reqwest 기반 `Reporter`)
    pub fn reporter(mut self, reporter: Arc<dyn MetricReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// send 호출 샘플러 교체
    pub fn sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn before_send(mut self, hook: Arc<dyn BeforeSend>) -> Self {
        self.before_send = Some(hook);
        self
    }

    /// 기본 리포터의 블로킹 전송 타임아웃
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 트래커 생성 — 설정이 유효하지 않으면 에러
    pub fn build(self) -> Result<Tracker, CoreError> {
        let config = ConfigManager::new(self.config)?;
        let snapshot = config.get();
        if snapshot.debug {
            logging::init(true);
        }

        let reporter_config = ReporterConfig::from(&snapshot);
        let reporter: Arc<dyn MetricReporter> = match self.reporter {
            Some(reporter) => {
                reporter.set_config(reporter_config);
                reporter
            }
            None => Arc::new(Reporter::new(reporter_config, self.timeout)?),
        };

        let session_id = ids::new_session_id();
        info!(
            "트래커 생성: project={}, session={}",
            snapshot.project, session_id
        );

        Ok(Tracker {
            inner: Arc::new(Inner {
                config,
                session_id,
                buffer: Mutex::new(Vec::new()),
                reporter,
                plugins: Mutex::new(BTreeMap::new()),
                tags: RwLock::new(BTreeMap::new()),
                before_send: self.before_send,
                sampler: self.sampler,
                destroyed: AtomicBool::new(false),
                flushes: AtomicU64::new(0),
                failed_deliveries: AtomicU64::new(0),
                sampled_out: AtomicU64::new(0),
            }),
        })
    }
}

struct Inner {
    config: ConfigManager,
    session_id: String,
    buffer: Mutex<Vec<Metric>>,
    reporter: Arc<dyn MetricReporter>,
    plugins: Mutex<BTreeMap<String, Arc<dyn Plugin>>>,
    /// 모든 메트릭에 붙는 전역 태그
    tags: RwLock<BTreeMap<String, Value>>,
    before_send: Option<Arc<dyn BeforeSend>>,
    sampler: Arc<dyn Sampler>,
    destroyed: AtomicBool,
    flushes: AtomicU64,
    failed_deliveries: AtomicU64,
    sampled_out: AtomicU64,
}

/// 트래커 핸들 — 복제해도 같은 버퍼/세션을 공유한다
#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

impl Tracker {
    /// 기본 리포터로 트래커 생성
    pub fn new(config: TrackerConfig) -> Result<Self, CoreError> {
        Self::builder(config).build()
    }

    pub fn builder(config: TrackerConfig) -> TrackerBuilder {
        TrackerBuilder {
            config,
            reporter: None,
            sampler: Arc::new(RandomSampler),
            before_send: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    /// 현재 설정 (복제본)
    pub fn config(&self) -> TrackerConfig {
        self.inner.config.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> TrackerStats {
        TrackerStats {
            buffered: self.inner.buffer.lock().len(),
            capacity: self.inner.config.get().max_cache,
            session_id: self.inner.session_id.clone(),
            flushes: self.inner.flushes.load(Ordering::Relaxed),
            failed_deliveries: self.inner.failed_deliveries.load(Ordering::Relaxed),
            sampled_out: self.inner.sampled_out.load(Ordering::Relaxed),
        }
    }

    fn ensure_alive(&self, operation: &str) -> Result<(), CoreError> {
        if self.is_destroyed() {
            error!("파기된 트래커에서 {operation} 호출 — 무시");
            return Err(CoreError::Usage(format!(
                "{operation} called after destroy"
            )));
        }
        Ok(())
    }

    /// 메트릭 제출
    ///
    /// 샘플링에서 탈락하면 호출 전체가 no-op이다. 전송 실패는 여기로
    /// 전파되지 않고 버퍼에 재병합된다.
    pub async fn send(&self, metrics: Vec<Metric>, immediate: bool) -> Result<(), CoreError> {
        self.ensure_alive("send")?;

        let config = self.inner.config.get();
        if !self.inner.sampler.keep(config.sample_rate) {
            self.inner.sampled_out.fetch_add(1, Ordering::Relaxed);
            debug!("샘플링 제외: {}개 메트릭", metrics.len());
            return Ok(());
        }

        let tags = self.inner.tags.read().clone();
        let now = ids::now_ms();
        let enriched: Vec<Metric> = metrics
            .into_iter()
            .filter_map(|metric| match &self.inner.before_send {
                Some(hook) => apply_hook(hook.as_ref(), metric),
                None => Some(metric),
            })
            .map(|metric| self.enrich(metric, &config, &tags, now))
            .collect();

        let should_flush = {
            let mut buffer = self.inner.buffer.lock();
            buffer.extend(enriched);
            immediate || buffer.len() >= config.max_cache
        };

        if should_flush {
            self.deliver(true).await;
        }
        Ok(())
    }

    /// 소스가 비워 둔 컨텍스트만 채운다
    fn enrich(
        &self,
        mut metric: Metric,
        config: &TrackerConfig,
        tags: &BTreeMap<String, Value>,
        now: i64,
    ) -> Metric {
        if metric.session_id.is_none() {
            metric.session_id = Some(self.inner.session_id.clone());
        }
        if metric.timestamp.is_none() {
            metric.timestamp = Some(now);
        }
        if metric.project.is_none() {
            metric.project = Some(config.project.clone());
        }
        if metric.app_version.is_none() {
            metric.app_version = config.app_version.clone();
        }
        if metric.page_url.is_none() {
            metric.page_url = config.page_url.clone();
        }
        if metric.user_id.is_none() {
            metric.user_id = config.user_id.clone();
        }
        if metric.device.is_none() {
            metric.device = config.device.clone();
        }
        for (key, value) in tags {
            metric
                .tags
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        metric
    }

    /// 버퍼 전체를 블로킹 전송
    pub async fn flush(&self) {
        self.deliver(true).await;
    }

    /// 페이지 숨김/언로드 시 flush — beacon 우선 체인 사용
    pub async fn flush_on_hide(&self) {
        self.deliver(false).await;
    }

    async fn deliver(&self, immediate: bool) {
        let batch = std::mem::take(&mut *self.inner.buffer.lock());
        if batch.is_empty() {
            return;
        }
        self.inner.flushes.fetch_add(1, Ordering::Relaxed);
        let count = batch.len();

        match self.inner.reporter.send(&batch, immediate).await {
            Ok(DeliveryOutcome::Delivered(kind)) => {
                debug!("{count}개 메트릭 전송 ({kind:?})");
            }
            Ok(DeliveryOutcome::Skipped(reason)) => {
                debug!("전송 생략 ({reason:?}): {count}개 메트릭 폐기");
            }
            Err(e) => {
                self.inner.failed_deliveries.fetch_add(1, Ordering::Relaxed);
                let capacity = self.inner.config.get().max_cache;
                let mut buffer = self.inner.buffer.lock();
                let current = std::mem::take(&mut *buffer);
                *buffer = merge_failed(batch, current, capacity);
                warn!(
                    "전송 실패 — {count}개 메트릭 재큐잉 (버퍼 {}개): {e}",
                    buffer.len()
                );
            }
        }
    }

    /// 런타임 부분 설정 변경
    ///
    /// 엔드포인트/헤더/즉시 전송 여부는 리포터에 바로 반영된다.
    pub fn update_config(&self, patch: &ConfigPatch) -> Result<TrackerConfig, CoreError> {
        self.ensure_alive("update_config")?;
        let next = self.inner.config.apply(patch)?;
        self.inner.reporter.set_config(ReporterConfig::from(&next));
        if patch.debug == Some(true) {
            logging::init(true);
        }
        debug!("트래커 설정 변경: reportUrl={:?}", next.report_url);
        Ok(next)
    }

    /// 사용자 ID 설정 (이후 메트릭부터 적용)
    pub fn set_user(&self, user_id: impl Into<String>) -> Result<(), CoreError> {
        self.ensure_alive("set_user")?;
        let user_id = user_id.into();
        self.inner
            .config
            .update_with(|config| config.user_id = Some(user_id))?;
        Ok(())
    }

    /// 전역 태그 설정
    pub fn set_tag(
        &self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), CoreError> {
        self.ensure_alive("set_tag")?;
        self.inner.tags.write().insert(key.into(), value.into());
        Ok(())
    }

    /// 플러그인 설치
    ///
    /// 같은 이름이 이미 있으면 경고 후 건너뛴다. setup 실패 시 등록하지 않는다.
    pub fn use_plugin(&self, plugin: Arc<dyn Plugin>) -> Result<(), CoreError> {
        self.ensure_alive("use_plugin")?;
        let name = plugin.name().to_string();
        if self.inner.plugins.lock().contains_key(&name) {
            warn!("플러그인 '{name}' 이미 설치됨 — 건너뜀");
            return Ok(());
        }

        plugin.setup(Arc::new(TrackerSink {
            inner: Arc::downgrade(&self.inner),
            config: self.inner.config.clone(),
        }))?;

        let mut plugins = self.inner.plugins.lock();
        if plugins.contains_key(&name) {
            warn!("플러그인 '{name}' 동시 설치 감지 — 나중 설치 해제");
            drop(plugins);
            if let Err(e) = plugin.teardown() {
                warn!("플러그인 '{name}' 해제 실패: {e}");
            }
            return Ok(());
        }
        plugins.insert(name.clone(), plugin);
        info!("플러그인 설치: {name}");
        Ok(())
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.inner.plugins.lock().keys().cloned().collect()
    }

    /// 트래커 파기
    ///
    /// 모든 플러그인 해제(실패해도 계속) → 레지스트리 비움 → 마지막 flush
    /// → 리포터 파기. 두 번째 호출은 사용 에러이며 해제를 반복하지 않는다.
    pub async fn destroy(&self) -> Result<(), CoreError> {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            error!("이미 파기된 트래커에서 destroy 호출 — 무시");
            return Err(CoreError::Usage("destroy called twice".to_string()));
        }

        let plugins = std::mem::take(&mut *self.inner.plugins.lock());
        for (name, plugin) in plugins {
            match plugin.teardown() {
                Ok(()) => debug!("플러그인 해제: {name}"),
                Err(e) => warn!("플러그인 '{name}' 해제 실패 — 계속 진행: {e}"),
            }
        }

        self.deliver(true).await;
        self.inner.reporter.destroy();
        self.inner.buffer.lock().clear();
        info!("트래커 파기: session={}", self.inner.session_id);
        Ok(())
    }
}

#[async_trait]
impl MetricSink for Tracker {
    async fn submit(&self, metrics: Vec<Metric>, immediate: bool) -> Result<(), CoreError> {
        self.send(metrics, immediate).await
    }

    fn config_snapshot(&self) -> TrackerConfig {
        self.inner.config.get()
    }
}

/// 플러그인에 넘기는 싱크 — 트래커를 약하게 참조한다
///
/// 플러그인이 싱크를 들고 있어도 트래커 해제를 막지 않는다.
struct TrackerSink {
    inner: Weak<Inner>,
    config: ConfigManager,
}

#[async_trait]
impl MetricSink for TrackerSink {
    async fn submit(&self, metrics: Vec<Metric>, immediate: bool) -> Result<(), CoreError> {
        let Some(inner) = self.inner.upgrade() else {
            return Err(CoreError::Usage("submit called after tracker drop".to_string()));
        };
        Tracker { inner }.send(metrics, immediate).await
    }

    fn config_snapshot(&self) -> TrackerConfig {
        self.config.get()
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if *self.destroyed.get_mut() {
            return;
        }
        for (name, plugin) in std::mem::take(self.plugins.get_mut()) {
            if let Err(e) = plugin.teardown() {
                warn!("플러그인 '{name}' 해제 실패: {e}");
            }
        }
        let pending = self.buffer.get_mut().len();
        if pending > 0 {
            warn!("destroy 없이 트래커 해제 — 미전송 메트릭 {pending}개 폐기");
        }
        self.reporter.destroy();
    }
}

fn apply_hook(hook: &dyn BeforeSend, metric: Metric) -> Option<Metric> {
    let original = metric.clone();
    match catch_unwind(AssertUnwindSafe(move || hook.before_send(metric))) {
        Ok(Ok(Some(modified))) => Some(modified),
        Ok(Ok(None)) => {
            debug!("beforeSend 훅이 {} 메트릭 제외", original.kind());
            None
        }
        Ok(Err(e)) => {
            warn!("beforeSend 훅 실패 — 원본 유지: {e}");
            Some(original)
        }
        Err(_) => {
            warn!("beforeSend 훅 panic — 원본 유지");
            Some(original)
        }
    }
}
