// src/feeds/mod.rs
pub mod fetch;
pub mod parse;

use anyhow::Result;

pub use fetch::HttpFeedFetcher;
pub use parse::parse_feed;

/// One retrieved feed, items in the order the feed delivered them
/// (newest first for every source we poll).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    pub title: Option<String>,
    pub items: Vec<FeedItem>,
}

/// One feed entry, normalized across RSS 2.0 and Atom 1.0.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    /// RSS `guid` / Atom `id`.
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    /// Source-provided timestamp (`pubDate`, `published` or `updated`),
    /// carried through unparsed.
    pub published: Option<String>,
    /// RSS `description` / Atom `summary`.
    pub snippet: Option<String>,
    /// RSS `content:encoded` / Atom `content`.
    pub content: Option<String>,
}

impl FeedItem {
    /// Stable identity of the item: guid/id, else link, else title.
    /// Whitespace-only values do not count. `None` means the item cannot be
    /// deduplicated and must never trigger a notification.
    pub fn stable_id(&self) -> Option<&str> {
        [&self.guid, &self.link, &self.title]
            .into_iter()
            .filter_map(|v| v.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Retrieves one feed by URL.
#[async_trait::async_trait]
pub trait FeedFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FeedSnapshot>;
}
