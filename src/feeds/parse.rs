// src/feeds/parse.rs
//! XML -> `FeedSnapshot` for the two dialects our sources publish.
//! The root element name selects the dialect; any other root is an error the
//! caller treats as a failed fetch.

use anyhow::{Context, Result};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use serde::Deserialize;

use crate::feeds::{FeedItem, FeedSnapshot};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    guid: Option<TextValue>,
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    // quick-xml's serde deserializer matches elements by local name with the
    // namespace prefix stripped, so `<content:encoded>` arrives as `encoded`.
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
}

// --- Atom 1.0 ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    title: Option<TextValue>,
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<TextValue>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    published: Option<String>,
    updated: Option<String>,
    summary: Option<TextValue>,
    content: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

/// Text content of an element that may also carry attributes, e.g.
/// `<guid isPermaLink="false">..</guid>` or `<title type="html">..</title>`.
#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// Parse one feed document, RSS 2.0 or Atom 1.0.
pub fn parse_feed(xml: &str) -> Result<FeedSnapshot> {
    let clean = scrub_html_entities_for_xml(xml);
    match root_local_name(&clean).as_deref() {
        Some("rss") => parse_rss(&clean),
        Some("feed") => parse_atom(&clean),
        Some(other) => anyhow::bail!("unsupported feed root <{other}>"),
        None => anyhow::bail!("no xml root element found"),
    }
}

fn parse_rss(xml: &str) -> Result<FeedSnapshot> {
    let rss: Rss = from_str(xml).context("parsing rss xml")?;
    let items = rss
        .channel
        .items
        .into_iter()
        .map(|it| FeedItem {
            guid: it.guid.and_then(|g| g.value),
            title: it.title,
            link: it.link,
            published: it.pub_date,
            snippet: it.description,
            content: it.content_encoded,
        })
        .collect();
    Ok(FeedSnapshot {
        title: rss.channel.title,
        items,
    })
}

fn parse_atom(xml: &str) -> Result<FeedSnapshot> {
    let feed: AtomFeed = from_str(xml).context("parsing atom xml")?;
    let items = feed
        .entries
        .into_iter()
        .map(|e| {
            let link = pick_alternate_link(&e.links);
            FeedItem {
                guid: e.id,
                title: e.title.and_then(|t| t.value),
                link,
                published: e.published.or(e.updated),
                snippet: e.summary.and_then(|t| t.value),
                content: e.content.and_then(|t| t.value),
            }
        })
        .collect();
    Ok(FeedSnapshot {
        title: feed.title.and_then(|t| t.value),
        items,
    })
}

/// Atom entries may carry several `<link>` elements; the page link is the one
/// with `rel="alternate"` (or no rel at all).
fn pick_alternate_link(links: &[AtomLink]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")) && l.href.is_some())
        .or_else(|| links.iter().find(|l| l.href.is_some()))
        .and_then(|l| l.href.clone())
}

/// Local name of the document's root element, prefix stripped.
fn root_local_name(xml: &str) -> Option<String> {
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Feeds routinely embed HTML entities that are not valid XML; swap the common
/// ones before handing the document to quick-xml.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
