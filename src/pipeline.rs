// src/pipeline.rs
//! The polling pass: fetch + detect across all configured feeds, then
//! enrich + summarize each new post, then persist the store document once.

use std::sync::Arc;

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
};
use once_cell::sync::OnceCell;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::enrich::{Enricher, HttpPageFetcher, PageFetch};
use crate::feeds::{FeedFetch, HttpFeedFetcher};
use crate::novelty::{self, Post};
use crate::store::JsonStore;
use crate::summarize::{self, protocol, RenderedSummary, Summarizer, SummaryProvider};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("passes_total", "Completed polling passes.");
        describe_counter!(
            "pass_skipped_total",
            "Passes skipped because the previous one was still running."
        );
        describe_counter!("posts_detected_total", "New posts detected across all feeds.");
        describe_counter!("feed_fetch_errors_total", "Feed fetch/parse failures.");
        describe_counter!(
            "enrich_failures_total",
            "Article page fetches that yielded no text."
        );
        describe_counter!("summary_cache_hits_total", "Summaries served from the cache.");
        describe_counter!(
            "summary_fallback_total",
            "Summaries replaced by the fixed fallback text."
        );
        describe_counter!("summaries_created_total", "Summaries written to the cache.");
        describe_counter!(
            "event_end_extracted_total",
            "Event end dates extracted from post text."
        );
        describe_counter!("store_load_errors_total", "Unreadable store files on load.");
        describe_counter!("store_save_errors_total", "Failed store saves.");
        describe_histogram!("pass_duration_ms", "Polling pass duration in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when a pass last completed.");
    });
}

/// A detected post together with its summary, raw and rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizedPost {
    pub post: Post,
    pub summary_raw: String,
    pub rendered: RenderedSummary,
}

/// Outcome of one polling pass.
#[derive(Debug, Clone, PartialEq)]
pub enum PassOutcome {
    /// The pass ran; new posts in feed order, possibly none.
    Completed(Vec<SummarizedPost>),
    /// Another pass held the token; nothing was touched.
    Skipped,
}

pub struct UpdatePipeline {
    config: Config,
    store: JsonStore,
    feed_fetch: Arc<dyn FeedFetch>,
    enricher: Enricher,
    summarizer: Summarizer,
    pass_token: Mutex<()>,
}

impl UpdatePipeline {
    pub fn new(
        config: Config,
        store: JsonStore,
        feed_fetch: Arc<dyn FeedFetch>,
        page_fetch: Arc<dyn PageFetch>,
        provider: Arc<dyn SummaryProvider>,
    ) -> Self {
        Self {
            config,
            store,
            feed_fetch,
            enricher: Enricher::new(page_fetch),
            summarizer: Summarizer::new(provider),
            pass_token: Mutex::new(()),
        }
    }

    /// Production wiring: HTTP fetchers, store path and provider from the
    /// environment.
    pub fn from_config(config: Config) -> Self {
        let provider = summarize::provider_from_config(&config);
        Self::new(
            config,
            JsonStore::from_env(),
            Arc::new(HttpFeedFetcher::new()),
            Arc::new(HttpPageFetcher::new()),
            provider,
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// One polling pass over all configured feeds.
    ///
    /// Exactly one pass owns the store document at a time; a pass that finds
    /// the token taken returns `Skipped` without queueing. Per-feed failures
    /// skip that feed only. The store is saved once, at the end, whether or
    /// not anything was detected; a failed save is logged and counted but the
    /// detected posts are still returned.
    pub async fn run_polling_pass(&self) -> PassOutcome {
        ensure_metrics_described();

        let Ok(_guard) = self.pass_token.try_lock() else {
            tracing::warn!("previous polling pass still running, skipping this one");
            counter!("pass_skipped_total").increment(1);
            return PassOutcome::Skipped;
        };

        let t0 = std::time::Instant::now();
        let mut doc = self.store.load().await;
        let mut new_posts: Vec<Post> = Vec::new();

        for url in &self.config.feeds {
            let snapshot = match self.feed_fetch.fetch(url).await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(error = ?e, feed = %url, "feed fetch failed, skipping");
                    counter!("feed_fetch_errors_total").increment(1);
                    continue;
                }
            };
            if let Some(post) =
                novelty::detect_new_post(url, &snapshot, &mut doc, &self.config.event_name)
            {
                tracing::info!(source = %post.source, title = %post.title, "new post detected");
                new_posts.push(post);
            }
        }

        let mut out = Vec::with_capacity(new_posts.len());
        for post in new_posts {
            let page_text = self.enricher.enrich(&post).await;
            let summary_raw = self.summarizer.summarize(&post, &page_text, &mut doc).await;
            let rendered = protocol::parse_and_render(&summary_raw);
            out.push(SummarizedPost {
                post,
                summary_raw,
                rendered,
            });
        }

        if let Err(e) = self.store.save(&doc).await {
            tracing::error!(error = ?e, path = %self.store.path().display(), "store save failed");
            counter!("store_save_errors_total").increment(1);
        }

        counter!("passes_total").increment(1);
        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        histogram!("pass_duration_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        PassOutcome::Completed(out)
    }
}
