// src/api.rs
//! The small HTTP surface the hosting platform probes: a liveness banner,
//! `/health`, and the Prometheus scrape endpoint.

use axum::{routing::get, Router};

use crate::metrics::Metrics;

pub fn create_router(metrics: &Metrics) -> Router {
    Router::new()
        .route("/", get(|| async { "bss-update-notifier is running" }))
        .route("/health", get(|| async { "ok" }))
        .merge(metrics.router())
}
