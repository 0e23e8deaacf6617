//! Tests for metrics integration.
//!
//! Uses `metrics_util::debugging::DebuggingRecorder` to capture and assert
//! on emitted metrics without needing a real exporter.

use std::sync::Arc;

use metrics_util::MetricKind;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};

use huginn::{BuildPath, Huginn, InMemoryStore, telemetry};

// ============================================================================
// Snapshot type alias for readability
// ============================================================================

type SnapshotVec = Vec<(
    metrics_util::CompositeKey,
    Option<metrics::Unit>,
    Option<metrics::SharedString>,
    DebugValue,
)>;

// ============================================================================
// Helpers
// ============================================================================

/// Sum all counter values matching a given metric name.
fn counter_total(snapshot: &SnapshotVec, name: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| key.kind() == MetricKind::Counter && key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

/// Sum counter values for a metric name with a given label value.
fn counter_with_label(snapshot: &SnapshotVec, name: &str, label: &str, value: &str) -> u64 {
    snapshot
        .iter()
        .filter(|(key, _, _, _)| {
            key.kind() == MetricKind::Counter
                && key.key().name() == name
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == label && l.value() == value)
        })
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(v) => *v,
            _ => 0,
        })
        .sum()
}

fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    let build = "/kubernetes-jenkins/logs/e2e/1";
    store.insert(format!("{build}/started.json"), r#"{"version": "v1+56"}"#);
    store.insert(format!("{build}/finished.json"), r#"{"result": "SUCCESS"}"#);
    store.insert(
        format!("{build}/artifacts/junit_01.xml"),
        r#"<testsuite><testcase name="a" time="1"/></testsuite>"#,
    );
    store.insert(format!("{build}/artifacts/junit_02.xml"), "not xml <<<");
    store
}

// ============================================================================
// Tests
// ============================================================================

/// Runs async code within a local recorder scope on the multi-thread runtime.
///
/// `block_in_place` ensures the sync `with_local_recorder` closure stays
/// on the current thread while `block_on` drives the inner async work.
#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn aggregation_records_cache_storage_and_shard_metrics() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let store = seeded_store();

    let result = metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let viewer = Huginn::builder()
                    .store(store.clone())
                    .namespace("metrics-test")
                    .build()
                    .unwrap();
                let path = BuildPath::parse("/kubernetes-jenkins/logs/e2e/1").unwrap();
                let first = viewer.build(&path).await;
                let _second = viewer.build(&path).await;
                first
            })
        })
    });
    assert!(result.is_ok());

    let snapshot = snapshotter.snapshot().into_vec();

    // started, finished, junit_01, junit_02 were each read once.
    assert_eq!(counter_total(&snapshot, telemetry::STORAGE_CALLS_TOTAL), 4);
    assert_eq!(
        counter_total(&snapshot, telemetry::STORAGE_FAILURES_TOTAL),
        0
    );

    assert_eq!(
        counter_with_label(&snapshot, telemetry::SHARDS_TOTAL, "outcome", "parsed"),
        1
    );
    assert_eq!(
        counter_with_label(&snapshot, telemetry::SHARDS_TOTAL, "outcome", "failed"),
        1
    );

    // Second build() is one details hit.
    assert_eq!(
        counter_with_label(
            &snapshot,
            telemetry::CACHE_HITS_TOTAL,
            "operation",
            "build-details://"
        ),
        1
    );
    // One details miss plus four object misses.
    assert_eq!(counter_total(&snapshot, telemetry::CACHE_MISSES_TOTAL), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn missing_objects_record_storage_failures() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    let store = Arc::new(InMemoryStore::new());

    metrics::with_local_recorder(&recorder, || {
        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async {
                let viewer = Huginn::builder()
                    .store(store.clone())
                    .namespace("metrics-test")
                    .build()
                    .unwrap();
                viewer
                    .storage()
                    .read("/kubernetes-jenkins/logs/e2e/1/started.json")
                    .await
            })
        })
    });

    let snapshot = snapshotter.snapshot().into_vec();

    assert_eq!(
        counter_with_label(&snapshot, telemetry::STORAGE_FAILURES_TOTAL, "kind", "read"),
        1
    );
}
