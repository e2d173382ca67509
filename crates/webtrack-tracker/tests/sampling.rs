//! 샘플링 수렴 검증.
//!
//! send 호출 단위 샘플링과 요청 단위 샘플링은 독립적으로 적용되므로
//! 둘을 함께 쓰면 보고 비율은 두 비율의 곱이 된다.

mod common;

use common::{named, MockReporter};
use std::sync::Arc;
use webtrack_capture::NetworkCapture;
use webtrack_core::config::{NetworkCaptureOptions, TrackerConfig};
use webtrack_core::models::exchange::RawExchange;
use webtrack_tracker::Tracker;

const LARGE_CACHE: usize = 1_000_000;

fn tracker(sample_rate: f64) -> Tracker {
    Tracker::builder(
        TrackerConfig::new("shop")
            .with_report_url("https://collect.example.com/report")
            .with_sample_rate(sample_rate)
            .with_max_cache(LARGE_CACHE),
    )
    .reporter(MockReporter::new())
    .build()
    .unwrap()
}

async fn kept_ratio(tracker: &Tracker, calls: usize) -> f64 {
    for i in 0..calls {
        tracker.send(vec![named(&i.to_string())], false).await.unwrap();
    }
    tracker.stats().buffered as f64 / calls as f64
}

#[tokio::test]
async fn boundary_rates() {
    let none = tracker(0.0);
    assert_eq!(kept_ratio(&none, 500).await, 0.0);
    assert_eq!(none.stats().sampled_out, 500);

    let all = tracker(1.0);
    assert_eq!(kept_ratio(&all, 500).await, 1.0);
    assert_eq!(all.stats().sampled_out, 0);
}

#[tokio::test]
async fn call_sampling_converges_to_rate() {
    let tracker = tracker(0.3);
    let ratio = kept_ratio(&tracker, 10_000).await;
    assert!((ratio - 0.3).abs() < 0.03, "ratio={ratio}");
}

#[tokio::test]
async fn sampled_call_drops_every_metric_in_it() {
    let tracker = tracker(0.5);
    for _ in 0..2_000 {
        tracker
            .send(vec![named("a"), named("b")], false)
            .await
            .unwrap();
    }
    // 호출 단위 판정이므로 버퍼 길이는 항상 짝수
    assert_eq!(tracker.stats().buffered % 2, 0);
}

#[tokio::test]
async fn tracker_and_capture_sampling_compound() {
    let tracker = tracker(0.5);
    let capture = Arc::new(
        NetworkCapture::new(NetworkCaptureOptions {
            sample: 0.5,
            ..Default::default()
        })
        .unwrap(),
    );
    tracker.use_plugin(capture.clone()).unwrap();

    let requests = 8_000;
    for _ in 0..requests {
        capture
            .observe(RawExchange {
                url: "https://api.example.com/items".to_string(),
                method: "GET".to_string(),
                status: 200,
                ..Default::default()
            })
            .await;
    }

    let ratio = tracker.stats().buffered as f64 / requests as f64;
    assert!((ratio - 0.25).abs() < 0.03, "ratio={ratio}");
}
