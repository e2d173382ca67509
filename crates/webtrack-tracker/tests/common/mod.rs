//! 통합 테스트 공용 mock.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use webtrack_core::error::CoreError;
use webtrack_core::models::metric::{Metric, MetricData};
use webtrack_core::ports::plugin::Plugin;
use webtrack_core::ports::reporter::{
    DeliveryOutcome, MetricReporter, ReporterConfig, TransportKind,
};
use webtrack_core::ports::sink::MetricSink;

/// 첫 전송을 붙잡아 두는 게이트
pub struct Gate {
    pub entered: Arc<Notify>,
    pub release: Arc<Notify>,
}

/// 전송 기록 + 응답 스크립트 리포터
#[derive(Default)]
pub struct MockReporter {
    pub batches: Mutex<Vec<Vec<Metric>>>,
    pub immediates: Mutex<Vec<bool>>,
    pub configs: Mutex<Vec<ReporterConfig>>,
    pub destroyed: AtomicBool,
    /// 비어 있으면 성공
    responses: Mutex<VecDeque<Result<DeliveryOutcome, CoreError>>>,
    gate: Mutex<Option<Gate>>,
}

impl MockReporter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_failure(&self) {
        self.responses
            .lock()
            .push_back(Err(CoreError::Network("connection refused".to_string())));
    }

    /// 첫 전송이 `release`될 때까지 대기하도록 설정
    pub fn gate_first(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock() = Some(Gate {
            entered: entered.clone(),
            release: release.clone(),
        });
        (entered, release)
    }

    pub fn batch_count(&self) -> usize {
        self.batches.lock().len()
    }

    pub fn batch_names(&self, index: usize) -> Vec<String> {
        self.batches.lock()[index].iter().map(metric_name).collect()
    }
}

#[async_trait]
impl MetricReporter for MockReporter {
    async fn send(&self, batch: &[Metric], immediate: bool) -> Result<DeliveryOutcome, CoreError> {
        self.batches.lock().push(batch.to_vec());
        self.immediates.lock().push(immediate);

        let gate = self.gate.lock().take();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        let scripted = self.responses.lock().pop_front();
        scripted.unwrap_or(Ok(DeliveryOutcome::Delivered(TransportKind::Request)))
    }

    fn set_config(&self, config: ReporterConfig) {
        self.configs.lock().push(config);
    }

    fn destroy(&self) {
        self.destroyed.store(true, Ordering::SeqCst);
    }
}

/// 해제 횟수를 세는 플러그인
pub struct CountingPlugin {
    name: String,
    fail_teardown: bool,
    pub setups: AtomicUsize,
    pub teardowns: AtomicUsize,
}

impl CountingPlugin {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail_teardown: false,
            setups: AtomicUsize::new(0),
            teardowns: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            fail_teardown: true,
            setups: AtomicUsize::new(0),
            teardowns: AtomicUsize::new(0),
        })
    }
}

impl Plugin for CountingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, _sink: Arc<dyn MetricSink>) -> Result<(), CoreError> {
        self.setups.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn teardown(&self) -> Result<(), CoreError> {
        self.teardowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_teardown {
            return Err(CoreError::Usage(format!("{} teardown failed", self.name)));
        }
        Ok(())
    }
}

/// 이름으로 구분되는 custom 메트릭
pub fn named(name: &str) -> Metric {
    Metric::custom(name, serde_json::Value::Null)
}

pub fn metric_name(metric: &Metric) -> String {
    match &metric.data {
        MetricData::Custom(custom) => custom.name.clone(),
        other => format!("{other:?}"),
    }
}
