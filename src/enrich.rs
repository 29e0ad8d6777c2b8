// src/enrich.rs
//! Optional page enrichment: fetch the post's link and turn the page into
//! plain text for the summarizer. Everything here is best-effort; a post with
//! no usable page text still gets summarized from its feed text.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::novelty::Post;

/// Page text handed to the summarizer is capped at this many chars.
pub const PAGE_TEXT_CAP: usize = 12_000;

/// Retrieves the raw body of an article page.
#[async_trait]
pub trait PageFetch: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<String>;
}

/// HTTP implementation. Only 2xx responses with a textual content-type count;
/// anything else is an error the wrapper swallows.
pub struct HttpPageFetcher {
    http: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent(crate::USER_AGENT)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageFetch for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("page GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("page GET {url} returned {status}");
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("text/html") && !content_type.contains("text/plain") {
            anyhow::bail!("page GET {url} has non-text content-type '{content_type}'");
        }
        resp.text().await.with_context(|| format!("page body {url}"))
    }
}

/// Wrapper the pipeline uses. Never errors: a failed or unusable page fetch
/// yields an empty string, logged and counted.
pub struct Enricher {
    fetcher: Arc<dyn PageFetch>,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn PageFetch>) -> Self {
        Self { fetcher }
    }

    pub async fn enrich(&self, post: &Post) -> String {
        let url = post.link.trim();
        if url.is_empty() {
            return String::new();
        }
        match self.fetcher.fetch_page(url).await {
            Ok(body) => strip_html(&body),
            Err(e) => {
                tracing::debug!(error = ?e, link = url, "page enrichment skipped");
                counter!("enrich_failures_total").increment(1);
                String::new()
            }
        }
    }
}

/// HTML -> plain text: drop script/style blocks wholesale, replace remaining
/// tags with spaces, decode entities, collapse whitespace, cap the length.
pub fn strip_html(html: &str) -> String {
    static RE_SCRIPT: OnceCell<Regex> = OnceCell::new();
    let re_script = RE_SCRIPT.get_or_init(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
    static RE_STYLE: OnceCell<Regex> = OnceCell::new();
    let re_style = RE_STYLE.get_or_init(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());

    let mut out = re_script.replace_all(html, " ").to_string();
    out = re_style.replace_all(&out, " ").to_string();
    out = re_tags.replace_all(&out, " ").to_string();
    out = html_escape::decode_html_entities(&out).to_string();
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    if out.chars().count() > PAGE_TEXT_CAP {
        out = out.chars().take(PAGE_TEXT_CAP).collect();
    }
    out
}
