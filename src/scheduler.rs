// src/scheduler.rs
//! Interval driver for the pipeline. One tick, one pass, awaited inline; the
//! pass token in the pipeline is the structural guard for everything else.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::countdown;
use crate::pipeline::{PassOutcome, UpdatePipeline};

/// Spawn the polling loop: one pass every `poll_minutes`, the first right
/// away. A pass that overruns its interval delays the next tick instead of
/// piling ticks up.
pub fn spawn_polling_scheduler(pipeline: Arc<UpdatePipeline>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let minutes = pipeline.config().poll_minutes;
        let mut ticker = tokio::time::interval(Duration::from_secs(minutes * 60));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_and_report(&pipeline).await;
        }
    })
}

/// One pass plus the log lines that stand in for the chat layer.
pub async fn run_and_report(pipeline: &UpdatePipeline) {
    match pipeline.run_polling_pass().await {
        PassOutcome::Completed(posts) => {
            tracing::info!(target: "poll", new_posts = posts.len(), "polling pass complete");
            for sp in &posts {
                tracing::info!(
                    target: "poll",
                    source = %sp.post.source,
                    title = %sp.post.title,
                    link = %sp.post.link,
                    whats_new = %sp.rendered.whats_new,
                    most_important = %sp.rendered.most_important,
                    notes = %sp.rendered.notes,
                    "new post"
                );
            }
            let doc = pipeline.store().load().await;
            if let Some(line) =
                countdown::countdown_line(pipeline.config(), &doc, chrono::Utc::now())
            {
                tracing::info!(target: "poll", countdown = %line, "event countdown");
            }
        }
        PassOutcome::Skipped => {}
    }
}
