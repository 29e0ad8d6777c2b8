// src/novelty.rs
//! New-post detection: compare the newest item of a feed snapshot against the
//! stored per-feed identifier and build the normalized `Post` for downstream.

use metrics::counter;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::countdown;
use crate::feeds::{FeedItem, FeedSnapshot};
use crate::store::StoreDoc;

/// Normalized unit of novelty handed to enrichment and summarization.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    /// Feed title, or "Feed" when the feed does not name itself.
    pub source: String,
    /// Item title, or "New update".
    pub title: String,
    /// Item link; empty when the item has none.
    pub link: String,
    /// Source-provided timestamp string, unparsed.
    pub date: String,
    /// Markup-stripped aggregate of title + snippet + content.
    pub text: String,
}

impl Post {
    /// Identity used by the summary cache: the link when present, else
    /// `source:title`.
    pub fn cache_key(&self) -> String {
        if self.link.trim().is_empty() {
            format!("{}:{}", self.source, self.title)
        } else {
            self.link.clone()
        }
    }
}

/// Inspect the newest item of the snapshot (index 0 only; if several posts
/// land between polls, only the newest one is announced).
///
/// `None` and an untouched store when the item has no stable identifier or
/// the identifier matches the stored one. Otherwise the new identifier is
/// written into `store.last_guids` before any downstream work, so a post
/// whose summary later degrades still counts as seen.
pub fn detect_new_post(
    feed_url: &str,
    snapshot: &FeedSnapshot,
    store: &mut StoreDoc,
    event_name: &str,
) -> Option<Post> {
    let latest = snapshot.items.first()?;
    let id = latest.stable_id()?.to_string();
    if store.last_guids.get(feed_url).map(String::as_str) == Some(id.as_str()) {
        return None;
    }

    let post = build_post(snapshot, latest);
    store.last_guids.insert(feed_url.to_string(), id);
    counter!("posts_detected_total").increment(1);

    // Best-effort side effect, independent of the novelty bookkeeping above.
    if let Some(end) = countdown::extract_event_end(event_name, &post.text) {
        let iso = countdown::to_store_iso(end);
        tracing::info!(end = %iso, source = %post.source, "event end date spotted in post");
        counter!("event_end_extracted_total").increment(1);
        store.event_end_iso = Some(iso);
    }

    Some(post)
}

fn build_post(snapshot: &FeedSnapshot, item: &FeedItem) -> Post {
    let source = non_empty(snapshot.title.as_deref())
        .unwrap_or("Feed")
        .to_string();
    let title = non_empty(item.title.as_deref())
        .unwrap_or("New update")
        .to_string();
    let link = item.link.clone().unwrap_or_default();
    let date = item.published.clone().unwrap_or_default();
    let text = flatten_text(&[
        item.title.as_deref(),
        item.snippet.as_deref(),
        item.content.as_deref(),
    ]);

    Post {
        source,
        title,
        link,
        date,
        text,
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|t| !t.is_empty())
}

/// Join the textual parts of an item and strip the markup feeds sneak in:
/// entity decode, drop tags, collapse whitespace.
fn flatten_text(parts: &[Option<&str>]) -> String {
    let joined = parts.iter().filter_map(|p| *p).collect::<Vec<_>>().join(" ");
    let mut out = html_escape::decode_html_entities(&joined).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(guid: Option<&str>, title: Option<&str>, link: Option<&str>) -> FeedSnapshot {
        FeedSnapshot {
            title: Some("Game Blog".into()),
            items: vec![FeedItem {
                guid: guid.map(Into::into),
                title: title.map(Into::into),
                link: link.map(Into::into),
                published: Some("Mon, 05 Jan 2026 10:00:00 GMT".into()),
                snippet: Some("short blurb".into()),
                content: None,
            }],
        }
    }

    #[test]
    fn first_observation_emits_post_and_advances() {
        let mut store = StoreDoc::default();
        let snap = snapshot_with(Some("g1"), Some("Patch 1"), Some("https://x/p1"));
        let post = detect_new_post("https://x/feed", &snap, &mut store, "Beesmas");
        let post = post.expect("new post");
        assert_eq!(post.source, "Game Blog");
        assert_eq!(post.title, "Patch 1");
        assert_eq!(store.last_guids["https://x/feed"], "g1");
    }

    #[test]
    fn unchanged_identifier_is_idempotent() {
        let mut store = StoreDoc::default();
        let snap = snapshot_with(Some("g1"), Some("Patch 1"), Some("https://x/p1"));
        assert!(detect_new_post("https://x/feed", &snap, &mut store, "Beesmas").is_some());
        assert!(detect_new_post("https://x/feed", &snap, &mut store, "Beesmas").is_none());
        assert_eq!(store.last_guids["https://x/feed"], "g1");
    }

    #[test]
    fn changed_identifier_advances_again() {
        let mut store = StoreDoc::default();
        store.last_guids.insert("https://x/feed".into(), "g1".into());
        let snap = snapshot_with(Some("g2"), Some("Patch 2"), Some("https://x/p2"));
        let post = detect_new_post("https://x/feed", &snap, &mut store, "Beesmas");
        assert!(post.is_some());
        assert_eq!(store.last_guids["https://x/feed"], "g2");
    }

    #[test]
    fn identifierless_item_is_ignored_and_store_untouched() {
        let mut store = StoreDoc::default();
        let snap = snapshot_with(None, None, None);
        assert!(detect_new_post("https://x/feed", &snap, &mut store, "Beesmas").is_none());
        assert!(store.last_guids.is_empty());
    }

    #[test]
    fn empty_feed_is_ignored() {
        let mut store = StoreDoc::default();
        let snap = FeedSnapshot::default();
        assert!(detect_new_post("https://x/feed", &snap, &mut store, "Beesmas").is_none());
        assert!(store.last_guids.is_empty());
    }

    #[test]
    fn defaults_fill_missing_source_and_title() {
        let mut store = StoreDoc::default();
        let snap = FeedSnapshot {
            title: None,
            items: vec![FeedItem {
                guid: Some("g1".into()),
                ..Default::default()
            }],
        };
        let post = detect_new_post("u", &snap, &mut store, "Beesmas").expect("post");
        assert_eq!(post.source, "Feed");
        assert_eq!(post.title, "New update");
        assert_eq!(post.link, "");
        assert_eq!(post.cache_key(), "Feed:New update");
    }

    #[test]
    fn cache_key_prefers_the_link() {
        let post = Post {
            source: "Game Blog".into(),
            title: "Patch 1".into(),
            link: "https://x/p1".into(),
            date: String::new(),
            text: String::new(),
        };
        assert_eq!(post.cache_key(), "https://x/p1");
    }

    #[test]
    fn post_text_is_markup_stripped() {
        let mut store = StoreDoc::default();
        let snap = FeedSnapshot {
            title: Some("Game Blog".into()),
            items: vec![FeedItem {
                guid: Some("g1".into()),
                title: Some("Patch &amp; fixes".into()),
                snippet: Some("<p>Bug   fixes</p>".into()),
                content: Some("<div>More <b>details</b></div>".into()),
                ..Default::default()
            }],
        };
        let post = detect_new_post("u", &snap, &mut store, "Beesmas").expect("post");
        assert_eq!(post.text, "Patch & fixes Bug fixes More details");
    }

    #[test]
    fn event_end_phrase_lands_in_the_store() {
        let mut store = StoreDoc::default();
        let snap = FeedSnapshot {
            title: Some("Game Blog".into()),
            items: vec![FeedItem {
                guid: Some("g1".into()),
                title: Some("Holiday patch".into()),
                snippet: Some("Beesmas ends on January 5, 2026! Enjoy.".into()),
                ..Default::default()
            }],
        };
        detect_new_post("u", &snap, &mut store, "Beesmas").expect("post");
        assert_eq!(store.event_end_iso.as_deref(), Some("2026-01-05T00:00:00Z"));
    }

    #[test]
    fn event_extraction_failure_leaves_store_date_alone() {
        let mut store = StoreDoc::default();
        store.event_end_iso = Some("2026-02-01T00:00:00Z".into());
        let snap = snapshot_with(Some("g1"), Some("Patch"), None);
        detect_new_post("u", &snap, &mut store, "Beesmas").expect("post");
        assert_eq!(store.event_end_iso.as_deref(), Some("2026-02-01T00:00:00Z"));
    }
}
