//! Update notifier binary entrypoint.
//! Boots the polling scheduler plus the small HTTP surface (liveness and
//! metrics) the hosting platform probes.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use bss_update_notifier::config::{self, Config};
use bss_update_notifier::metrics::Metrics;
use bss_update_notifier::pipeline::UpdatePipeline;
use bss_update_notifier::{api, scheduler};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("bss_update_notifier=info,poll=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = Config::load_default().context("loading configuration")?;
    config::log_env_presence();
    tracing::info!(
        feeds = cfg.feeds.len(),
        poll_minutes = cfg.poll_minutes,
        model = %cfg.summary_model,
        "starting update notifier"
    );

    let metrics = Metrics::init(cfg.poll_minutes);
    let pipeline = Arc::new(UpdatePipeline::from_config(cfg));
    let _poller = scheduler::spawn_polling_scheduler(pipeline);

    let app = api::create_router(&metrics);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config::http_port()));
    tracing::info!(%addr, "serving health and metrics");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    axum::serve(listener, app).await.context("serve http")?;
    Ok(())
}
