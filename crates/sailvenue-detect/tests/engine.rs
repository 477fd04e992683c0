//! End-to-end detection scenarios against the bundled venue registry.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sailvenue_core::{AgentSettings, DetectSettings, GeoPoint};
use sailvenue_detect::{
    DetectError, DetectOptions, DetectionEngine, DetectionSource, InMemoryRegistry,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HARBOUR_FIX: (f64, f64) = (22.2793, 114.1628);
const PACIFIC_FIX: (f64, f64) = (0.0, -140.0);

fn venues_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/venues.yaml")
}

fn registry() -> Arc<InMemoryRegistry> {
    Arc::new(InMemoryRegistry::from_file(&venues_path()).expect("bundled registry should load"))
}

fn agent_settings(url: &str) -> AgentSettings {
    AgentSettings {
        url: url.to_string(),
        api_key: "test-key".to_string(),
        model: "venue-model".to_string(),
        request_timeout_secs: 30,
    }
}

fn engine(agent_url: Option<&str>) -> DetectionEngine {
    let settings = agent_url.map(agent_settings);
    DetectionEngine::from_registry(registry(), settings.as_ref(), DetectSettings::default())
        .expect("engine should build")
}

fn point((lat, lng): (f64, f64)) -> GeoPoint {
    GeoPoint::new(lat, lng)
}

fn harbour_answer() -> serde_json::Value {
    serde_json::json!({
        "status": "ok",
        "result": {
            "venue": {
                "venue_id": "hong-kong-victoria-harbor",
                "distance_km": 0.5,
                "confidence": 0.99
            },
            "alternatives": [
                { "venue_id": "hong-kong-aberdeen", "distance_km": 3.6, "confidence": 0.8 }
            ],
            "reasoning": "Within Victoria Harbour."
        }
    })
}

#[test]
fn bundled_registry_is_valid() {
    let registry = registry();
    assert!(registry.len() >= 5);
    assert!(registry
        .venues()
        .iter()
        .any(|v| v.id == "hong-kong-victoria-harbor"));
}

#[tokio::test]
async fn harbour_fix_is_detected_by_agent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tools/invoke"))
        .respond_with(ResponseTemplate::new(200).set_body_json(harbour_answer()))
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(Some(&server.uri()));
    let result = engine
        .detect(point(HARBOUR_FIX), &DetectOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.source, DetectionSource::Ai);
    assert_eq!(result.venue_id.as_deref(), Some("hong-kong-victoria-harbor"));
    let distance = result.distance_km.unwrap();
    assert!((distance - 0.5).abs() < 0.05, "distance {distance}");
    let confidence = result.confidence.unwrap();
    assert!(confidence > 0.98 && confidence <= 1.0, "confidence {confidence}");
    assert_eq!(result.alternatives.len(), 1);
    assert_eq!(result.alternatives[0].venue.id, "hong-kong-aberdeen");
    assert_eq!(result.reasoning.as_deref(), Some("Within Victoria Harbour."));
}

#[tokio::test]
async fn harbour_fix_without_agent_uses_fallback() {
    let engine = engine(None);
    assert!(!engine.agent_enabled());

    let result = engine
        .detect(point(HARBOUR_FIX), &DetectOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.source, DetectionSource::Fallback);
    assert_eq!(result.venue_id.as_deref(), Some("hong-kong-victoria-harbor"));
    assert!(result.confidence.unwrap() > 0.98);
    assert!(result.alternatives.len() <= 3);
    assert!(result
        .alternatives
        .windows(2)
        .all(|w| w[0].distance_km <= w[1].distance_km));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn open_ocean_fix_finds_nothing() {
    let engine = engine(None);
    let result = engine
        .detect(point(PACIFIC_FIX), &DetectOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.venue_id.is_none());
    assert!(result.confidence.is_none());
    assert!(result.alternatives.is_empty());
    assert!(result.error.is_none());
    assert_eq!(result.source, DetectionSource::Fallback);
}

#[tokio::test]
async fn agent_server_error_falls_back_silently() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let engine = engine(Some(&server.uri()));
    let result = engine
        .detect(point(HARBOUR_FIX), &DetectOptions::default())
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.source, DetectionSource::Fallback);
    assert_eq!(result.venue_id.as_deref(), Some("hong-kong-victoria-harbor"));
    assert!(result.error.is_none());
}

#[tokio::test]
async fn slow_agent_is_abandoned_at_deadline() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(harbour_answer())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let engine = engine(Some(&server.uri()));
    let started = Instant::now();
    let result = engine
        .detect(
            point(HARBOUR_FIX),
            &DetectOptions {
                deadline_ms: Some(300),
                ..DetectOptions::default()
            },
        )
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.source, DetectionSource::Fallback);
    assert_eq!(result.venue_id.as_deref(), Some("hong-kong-victoria-harbor"));
}

#[tokio::test]
async fn agent_agreeing_on_empty_ocean_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "ok",
            "result": { "venue": null, "alternatives": [], "reasoning": "Open ocean." }
        })))
        .mount(&server)
        .await;

    let engine = engine(Some(&server.uri()));
    let result = engine
        .detect(point(PACIFIC_FIX), &DetectOptions::default())
        .await
        .unwrap();

    assert!(!result.success);
    assert!(result.venue_id.is_none());
    assert_eq!(result.source, DetectionSource::Ai);
}

#[tokio::test]
async fn concurrent_identical_requests_share_one_agent_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(harbour_answer())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine(Some(&server.uri()));
    let options = DetectOptions::default();
    let (a, b) = tokio::join!(
        engine.detect(point(HARBOUR_FIX), &options),
        engine.detect(GeoPoint::new(22.279_31, 114.162_81), &options),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_eq!(a.venue_id, b.venue_id);
    assert_eq!(a.source, DetectionSource::Ai);
    assert!(a.cached != b.cached, "exactly one caller should compute");

    let again = engine
        .detect(point(HARBOUR_FIX), &options)
        .await
        .unwrap();
    assert!(again.cached);
}

#[tokio::test]
async fn invalid_latitude_is_rejected() {
    let engine = engine(None);
    let err = engine
        .detect(GeoPoint::new(91.0, 0.0), &DetectOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, DetectError::Validation(_)), "got {err:?}");
}

#[tokio::test]
async fn non_positive_radius_is_rejected() {
    let engine = engine(None);
    let err = engine
        .detect(
            point(HARBOUR_FIX),
            &DetectOptions {
                radius_km: Some(0.0),
                ..DetectOptions::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DetectError::Validation(_)), "got {err:?}");
}
