use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use traffic_geojson::config::Config;
use traffic_geojson::fetch::HttpClient;
use traffic_geojson::fetch::auth::QueryKey;
use traffic_geojson::geojson::Geometry;
use traffic_geojson::output::{RunOutcome, read_collection};
use traffic_geojson::pipeline::run;
use traffic_geojson::source::SourceError;
use traffic_geojson::traffic::{TrafficApi, TrafficConfig};

const SEGMENT: &str = include_str!("fixtures/flow_segment.json");

/// Answers traffic requests from a queue of `(status, body)` pairs and
/// remembers every URL it was asked for.
struct FakeTraffic {
    replies: Mutex<VecDeque<(u16, String)>>,
    urls: Mutex<Vec<String>>,
}

impl FakeTraffic {
    fn new(replies: Vec<(u16, &str)>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|(s, b)| (s, b.to_string())).collect()),
            urls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpClient for FakeTraffic {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.urls.lock().unwrap().push(req.url().to_string());
        let (status, body) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((200, "{}".to_string()));
        Ok(http::Response::builder()
            .status(status)
            .body(body)
            .unwrap()
            .into())
    }
}

fn config(source: &str, output: &Path) -> Config {
    Config {
        source: source.to_string(),
        output: output.to_path_buf(),
        traffic: TrafficConfig::default(),
        stamp_timestamp: true,
    }
}

fn fixture(name: &str) -> String {
    format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
}

#[tokio::test]
async fn test_full_pipeline_writes_successful_rows() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("traffic_data.geojson");
    let config = config(&fixture("road_midpoints.csv"), &output);

    let source = FakeTraffic::new(vec![]);
    let traffic = FakeTraffic::new(vec![
        (200, SEGMENT),
        (500, "Internal Server Error"),
        (200, SEGMENT),
    ]);
    let api = TrafficApi::new(QueryKey::tomtom(&traffic, "test-key"), config.traffic.clone()).unwrap();

    let outcome = run(&config, &source, &api).await.unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Written {
            path: output.clone(),
            features: 2
        }
    );
    assert_eq!(traffic.calls(), 3);
    assert!(traffic.urls.lock().unwrap()[0].ends_with("&key=test-key"));
    assert_eq!(source.calls(), 0);

    let collection = read_collection(&output).unwrap();
    assert_eq!(collection.len(), 2);

    let Geometry::LineString { coordinates } = &collection.features[0].geometry;
    assert_eq!(coordinates.len(), 4);
    assert_eq!(coordinates[0], [-111.953712, 40.666512]);
    assert_eq!(coordinates[3], [-111.953601, 40.667904]);

    let props = &collection.features[0].properties;
    assert_eq!(props.current_speed, Some(52.0));
    assert_eq!(props.free_flow_speed, Some(64.0));
    assert_eq!(props.confidence, Some(0.98));
    assert_eq!(props.road_closure, Some(false));
    assert!(props.last_updated.is_some());
}

#[tokio::test]
async fn test_all_rows_failing_preserves_previous_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("traffic_data.geojson");
    fs::write(&output, r#"{"type":"FeatureCollection","features":[]}"#).unwrap();
    let before = fs::read(&output).unwrap();

    let config = config(&fixture("road_midpoints.csv"), &output);
    let traffic = FakeTraffic::new(vec![
        (503, "unavailable"),
        (200, r#"{"flowSegmentData": null}"#),
        (403, "Forbidden"),
    ]);
    let api = TrafficApi::new(&traffic, config.traffic.clone()).unwrap();

    let outcome = run(&config, &FakeTraffic::new(vec![]), &api).await.unwrap();

    assert_eq!(outcome, RunOutcome::Preserved { path: output.clone() });
    assert_eq!(traffic.calls(), 3);
    assert_eq!(fs::read(&output).unwrap(), before);
}

#[tokio::test]
async fn test_schema_mismatch_aborts_before_any_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("traffic_data.geojson");
    let config = config(&fixture("missing_columns.csv"), &output);

    let traffic = FakeTraffic::new(vec![(200, SEGMENT)]);
    let api = TrafficApi::new(&traffic, config.traffic.clone()).unwrap();

    let err = run(&config, &FakeTraffic::new(vec![]), &api).await.unwrap_err();

    match err.downcast_ref::<SourceError>() {
        Some(SourceError::SchemaMismatch { missing }) => {
            assert_eq!(missing, &vec!["Latitude", "Longitude"]);
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
    assert_eq!(traffic.calls(), 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_remote_source_is_fetched_once() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.geojson");
    let config = config("https://data.example.com/road_midpoints.csv", &output);

    let csv = fs::read_to_string(fixture("road_midpoints.csv")).unwrap();
    let source = FakeTraffic::new(vec![(200, csv.as_str())]);
    let traffic = FakeTraffic::new(vec![(200, SEGMENT), (200, "{}"), (200, "{}")]);
    let api = TrafficApi::new(&traffic, config.traffic.clone()).unwrap();

    let outcome = run(&config, &source, &api).await.unwrap();

    assert_eq!(source.calls(), 1);
    assert!(!source.urls.lock().unwrap()[0].contains("key="));
    assert_eq!(
        outcome,
        RunOutcome::Written {
            path: output.clone(),
            features: 1
        }
    );
}

#[tokio::test]
async fn test_unreachable_source_is_data_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(
        "https://data.example.com/road_midpoints.csv",
        &dir.path().join("out.geojson"),
    );

    let source = FakeTraffic::new(vec![(404, "Not Found")]);
    let traffic = FakeTraffic::new(vec![]);
    let api = TrafficApi::new(&traffic, config.traffic.clone()).unwrap();

    let err = run(&config, &source, &api).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SourceError>(),
        Some(SourceError::DataUnavailable { .. })
    ));
    assert_eq!(traffic.calls(), 0);
}
