//! Integration tests for build detail aggregation through `BuildViewer`,
//! backed by an `InMemoryStore`.

use std::io::Write;
use std::sync::Arc;

use flate2::Compression;
use flate2::write::GzEncoder;

use huginn::{
    BuildPath, BuildReport, BuildViewer, FailureRecord, Huginn, HuginnError, InMemoryStore,
};

const BUILD: &str = "/kubernetes-jenkins/logs/e2e-gce/1234";

fn shard(failures: &[(&str, &str, &str)]) -> String {
    let mut xml = String::from("<testsuite>");
    for (name, time, body) in failures {
        xml.push_str(&format!(
            r#"<testcase name="{name}" time="{time}"><failure>{body}</failure></testcase>"#
        ));
    }
    xml.push_str(r#"<testcase name="Passing" time="0.1"/></testsuite>"#);
    xml
}

fn shard_path(index: u32) -> String {
    format!("{BUILD}/artifacts/junit_{index:02}.xml")
}

fn failure_names(report: &BuildReport) -> Vec<&str> {
    report
        .details
        .failures
        .iter()
        .map(|f| f.name.as_str())
        .collect()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn seed_markers(store: &InMemoryStore, build: &str) {
    store.insert(
        format!("{build}/started.json"),
        r#"{"version": "v1.3.0+56", "timestamp": 1406535800}"#,
    );
    store.insert(
        format!("{build}/finished.json"),
        r#"{"result": "FAILURE", "timestamp": 1406536800}"#,
    );
}

fn viewer(store: &Arc<InMemoryStore>, namespace: &str) -> BuildViewer {
    Huginn::builder()
        .store(store.clone())
        .namespace(namespace)
        .build()
        .unwrap()
}

fn path() -> BuildPath {
    BuildPath::parse(BUILD).unwrap()
}

#[tokio::test]
async fn aggregates_markers_and_failures() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    store.insert(shard_path(1), shard(&[("TestFoo", "1.5", "boom")]));

    let report = viewer(&store, "v1").build(&path()).await.unwrap();

    assert_eq!(report.job, "e2e-gce");
    assert_eq!(report.build, "1234");
    assert_eq!(report.commit.as_deref(), Some("56"));
    assert_eq!(report.started_at.as_deref(), Some("2014-07-28 08:23"));
    assert_eq!(report.details.finished.result.as_deref(), Some("FAILURE"));
    assert_eq!(report.details.duration_secs(), Some(1000));
    assert_eq!(
        report.details.failures,
        vec![FailureRecord::new("TestFoo", 1.5, Some("boom".into()))]
    );
}

#[tokio::test]
async fn gap_in_shards_ends_enumeration() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    store.insert(shard_path(1), shard(&[("One", "1", "a")]));
    store.insert(shard_path(2), shard(&[("Two", "2", "b")]));
    store.insert(shard_path(4), shard(&[("Four", "4", "d")]));

    let report = viewer(&store, "v1").build(&path()).await.unwrap();

    assert_eq!(failure_names(&report), ["One", "Two"]);
}

#[tokio::test]
async fn gzipped_shards_are_inflated() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    store.insert(shard_path(1), shard(&[("Plain", "1", "p")]));
    store.insert(
        shard_path(2),
        gzip(shard(&[("Zipped", "2", "z")]).as_bytes()),
    );

    let report = viewer(&store, "v1").build(&path()).await.unwrap();

    assert_eq!(failure_names(&report), ["Plain", "Zipped"]);
}

#[tokio::test]
async fn corrupt_shard_stops_enumeration() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    store.insert(shard_path(1), shard(&[("First", "1", "a")]));
    store.insert(shard_path(2), "<testsuite><testcase");
    store.insert(shard_path(3), shard(&[("Third", "3", "c")]));

    let report = viewer(&store, "v1").build(&path()).await.unwrap();

    assert_eq!(failure_names(&report), ["First"]);
}

#[tokio::test]
async fn build_without_shards_has_no_failures() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);

    let report = viewer(&store, "v1").build(&path()).await.unwrap();
    assert!(report.details.failures.is_empty());
}

#[tokio::test]
async fn unfinished_build_is_unavailable() {
    let store = Arc::new(InMemoryStore::new());
    store.insert(format!("{BUILD}/started.json"), r#"{"version": "v1+56"}"#);

    let err = viewer(&store, "v1").build(&path()).await.unwrap_err();

    assert!(err.is_not_found());
    assert!(err.to_string().contains("details could not be loaded"));
}

#[tokio::test]
async fn malformed_marker_is_unavailable() {
    let store = Arc::new(InMemoryStore::new());
    store.insert(format!("{BUILD}/started.json"), "{not json");
    store.insert(format!("{BUILD}/finished.json"), r#"{"result": "SUCCESS"}"#);

    let err = viewer(&store, "v1").build(&path()).await.unwrap_err();
    assert!(matches!(err, HuginnError::NotFound(_)));
}

#[tokio::test]
async fn second_aggregation_reads_nothing() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    store.insert(shard_path(1), shard(&[("TestFoo", "1.5", "boom")]));
    let viewer = viewer(&store, "v1");

    let first = viewer.build(&path()).await.unwrap();
    let reads = store.read_count();
    // started, finished, shard 01, missing shard 02
    assert_eq!(reads, 4);

    let second = viewer.build(&path()).await.unwrap();
    assert_eq!(store.read_count(), reads);
    assert_eq!(first, second);
}

#[tokio::test]
async fn unavailable_build_is_cached_negatively() {
    let store = Arc::new(InMemoryStore::new());
    store.insert(format!("{BUILD}/started.json"), r#"{"version": "v1+56"}"#);
    let viewer = viewer(&store, "v1");

    assert!(viewer.build(&path()).await.is_err());
    let reads = store.read_count();

    // Finishing the build does not help until the negative entry expires.
    store.insert(format!("{BUILD}/finished.json"), r#"{"result": "SUCCESS"}"#);
    assert!(viewer.build(&path()).await.is_err());
    assert_eq!(store.read_count(), reads);
}

#[tokio::test]
async fn namespaces_do_not_share_entries() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    let backend = Arc::new(huginn::MemoryBackend::new(1000));

    let old = Huginn::builder()
        .store(store.clone())
        .backend(backend.clone())
        .namespace("deploy-1")
        .build()
        .unwrap();
    let new = Huginn::builder()
        .store(store.clone())
        .backend(backend)
        .namespace("deploy-2")
        .build()
        .unwrap();

    old.build(&path()).await.unwrap();
    let reads = store.read_count();

    new.build(&path()).await.unwrap();
    assert_eq!(store.read_count(), reads * 2);
}

#[tokio::test]
async fn disallowed_bucket_is_rejected_before_storage() {
    let store = Arc::new(InMemoryStore::new());
    let build = "/other-bucket/logs/e2e-gce/1";
    seed_markers(&store, build);

    let err = viewer(&store, "v1")
        .build(&BuildPath::parse(build).unwrap())
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(store.read_count(), 0);
}

#[tokio::test]
async fn extra_buckets_can_be_allowed() {
    let store = Arc::new(InMemoryStore::new());
    let build = "/my-ci-logs/pr-logs/e2e/7";
    seed_markers(&store, build);

    let viewer = Huginn::builder()
        .store(store.clone())
        .namespace("v1")
        .allowed_buckets(["kubernetes-jenkins", "my-ci-logs"])
        .build()
        .unwrap();

    let path = BuildPath::parse(build).unwrap();
    assert!(viewer.build(&path).await.is_ok());
}

#[tokio::test]
async fn linkify_uses_report_commit() {
    let store = Arc::new(InMemoryStore::new());
    seed_markers(&store, BUILD);
    store.insert(
        shard_path(1),
        shard(&[(
            "TestLink",
            "3",
            "/go/src/k8s.io/kubernetes/test/example.go:123\nError Goes Here",
        )]),
    );
    let viewer = viewer(&store, "v1");

    let report = viewer.build(&path()).await.unwrap();
    let detail = report.details.failures[0].detail.as_deref().unwrap();
    let html = viewer.linkify(detail, report.commit.as_deref());

    let href = r#"href="https://github.com/kubernetes/kubernetes/blob/56/test/example.go#L123""#;
    assert!(html.contains(href));
}
