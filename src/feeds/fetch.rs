// src/feeds/fetch.rs
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::feeds::{parse_feed, FeedFetch, FeedSnapshot};

/// HTTP implementation used in production. One shared client, identifying
/// user-agent, tight timeouts so one dead feed cannot stall the whole pass.
pub struct HttpFeedFetcher {
    http: reqwest::Client,
}

impl HttpFeedFetcher {
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

impl Default for HttpFeedFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FeedFetch for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<FeedSnapshot> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("feed GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("feed GET {url} returned {status}");
        }
        let body = resp
            .text()
            .await
            .with_context(|| format!("feed body {url}"))?;
        parse_feed(&body).with_context(|| format!("parse feed {url}"))
    }
}
