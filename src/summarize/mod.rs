// src/summarize/mod.rs
pub mod openai;
pub mod protocol;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;

use crate::config::Config;
use crate::novelty::Post;
use crate::store::StoreDoc;

pub use openai::OpenAiSummaries;
pub use protocol::{parse_and_render, parse_sections, render, RenderedSummary, SummarySections};

const SYSTEM_PROMPT: &str =
    "You summarize game update posts for a chat community. Be concise.";

/// One completion call against whichever model backs us.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Deterministic provider for tests and key-less local runs.
pub struct MockSummaries {
    pub fixed: String,
}

#[async_trait]
impl SummaryProvider for MockSummaries {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Provider wiring: `SUMMARY_TEST_MODE=mock` forces the deterministic mock,
/// anything else builds the real client from config + environment.
pub fn provider_from_config(cfg: &Config) -> Arc<dyn SummaryProvider> {
    if std::env::var("SUMMARY_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Arc::new(MockSummaries {
            fixed: "WHATS_NEW:\n- Mock summary line\n\nMOST_IMPORTANT:\n- Mock takeaway\n\nNOTES:\n- (mock)"
                .to_string(),
        });
    }
    let key = crate::config::openai_api_key().unwrap_or_default();
    Arc::new(OpenAiSummaries::new(key, cfg.summary_model.clone()))
}

/// Cache-first summarizer. The store document is mutated in place; persisting
/// it is the caller's job (once per polling pass).
pub struct Summarizer {
    provider: Arc<dyn SummaryProvider>,
}

impl Summarizer {
    pub fn new(provider: Arc<dyn SummaryProvider>) -> Self {
        Self { provider }
    }

    /// Returns the raw protocol text for this post. A cached entry is
    /// returned verbatim; otherwise the provider is called exactly once and
    /// the result (fallback included) is written into the cache, so a post is
    /// summarized at most once, ever.
    pub async fn summarize(&self, post: &Post, page_text: &str, store: &mut StoreDoc) -> String {
        let key = post.cache_key();
        if let Some(hit) = store.summaries.get(&key) {
            counter!("summary_cache_hits_total").increment(1);
            return hit.clone();
        }

        let prompt = build_prompt(post, page_text);
        let summary = match self.provider.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(s) if !s.trim().is_empty() => s.trim().to_string(),
            Ok(_) => {
                tracing::warn!(
                    provider = self.provider.name(),
                    key = %key,
                    "summary came back empty, using fallback"
                );
                counter!("summary_fallback_total").increment(1);
                fallback_summary(&post.title)
            }
            Err(e) => {
                tracing::warn!(
                    error = ?e,
                    provider = self.provider.name(),
                    key = %key,
                    "summary call failed, using fallback"
                );
                counter!("summary_fallback_total").increment(1);
                fallback_summary(&post.title)
            }
        };

        store.summaries.insert(key, summary.clone());
        counter!("summaries_created_total").increment(1);
        summary
    }
}

/// Fixed degradation text; cached like a real summary.
pub fn fallback_summary(title: &str) -> String {
    format!(
        "WHATS_NEW:\n- New post detected: {title}\n\nMOST_IMPORTANT:\n- Open the link for details\n\nNOTES:\n- (automatic fallback: summary unavailable)"
    )
}

fn build_prompt(post: &Post, page_text: &str) -> String {
    let link = if post.link.is_empty() {
        "(none)"
    } else {
        post.link.as_str()
    };
    let content = if !page_text.is_empty() {
        page_text
    } else if !post.text.is_empty() {
        post.text.as_str()
    } else {
        "(no page text available)"
    };
    format!(
        "Source: {}\nTitle: {}\nLink: {}\n\n\
         Summarize this game update for players.\n\
         Use EXACTLY this format:\n\
         WHATS_NEW:\n- bullet points of new things\n\n\
         MOST_IMPORTANT:\n- the top 1-3 takeaways\n\n\
         NOTES:\n- anything time-limited, plus warnings\n\n\
         Content: {}",
        post.source, post.title, link, content
    )
}
