// tests/api_http.rs
//! The sidecar HTTP surface: banner, health probe and Prometheus exposition.
//! One test function, because the Prometheus recorder installs once per
//! process.

use axum::body::{to_bytes, Body};
use http::Request;
use tower::ServiceExt;

use bss_update_notifier::api;
use bss_update_notifier::config::Config;
use bss_update_notifier::metrics::Metrics;
use bss_update_notifier::pipeline::{PassOutcome, UpdatePipeline};

async fn get(app: axum::Router, uri: &str) -> (http::StatusCode, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1_048_576).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn http_surface_serves_banner_health_and_metrics() {
    let metrics = Metrics::init(5);
    let app = api::create_router(&metrics);

    let (status, body) = get(app.clone(), "/").await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(body.contains("bss-update-notifier"));

    let (status, body) = get(app.clone(), "/health").await;
    assert_eq!(status, http::StatusCode::OK);
    assert_eq!(body, "ok");

    // A pass with no feeds configured still runs and records its series.
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var(
        "STORE_PATH",
        dir.path().join("data.json").display().to_string(),
    );
    let p = UpdatePipeline::from_config(Config::default());
    let outcome = p.run_polling_pass().await;
    assert_eq!(outcome, PassOutcome::Completed(Vec::new()));
    std::env::remove_var("STORE_PATH");

    let (status, body) = get(app, "/metrics").await;
    assert_eq!(status, http::StatusCode::OK);
    assert!(body.contains("poll_interval_minutes"));
    assert!(body.contains("passes_total"));
    assert!(body.contains("pass_duration_ms"));
}
