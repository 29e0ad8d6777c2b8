// tests/feed_parse.rs
//! Feed parsing against realistic fixture documents.

use bss_update_notifier::feeds::parse_feed;

const BLOG_RSS: &str = include_str!("fixtures/blog_rss.xml");
const RELEASES_ATOM: &str = include_str!("fixtures/releases_atom.xml");

#[test]
fn rss_fixture_maps_fields_and_keeps_document_order() {
    let snap = parse_feed(BLOG_RSS).unwrap();

    assert_eq!(snap.title.as_deref(), Some("Bee Swarm Simulator Blog"));
    assert_eq!(snap.items.len(), 2);

    let newest = &snap.items[0];
    assert_eq!(newest.guid.as_deref(), Some("bss-post-102"));
    assert_eq!(newest.title.as_deref(), Some("Beesmas 2025 Finale"));
    assert_eq!(
        newest.link.as_deref(),
        Some("https://beeswarm.example/blog/beesmas-finale")
    );
    assert_eq!(
        newest.published.as_deref(),
        Some("Mon, 22 Dec 2025 18:00:00 GMT")
    );
    // The &nbsp; in the raw document is scrubbed before the XML parse.
    let snippet = newest.snippet.as_deref().unwrap();
    assert!(snippet.contains("Beesmas ends on January 5, 2026!"));
    assert!(!snippet.contains("&nbsp;"));
    let content = newest.content.as_deref().unwrap();
    assert!(content.contains("<b>finale</b>"));

    let older = &snap.items[1];
    assert_eq!(older.guid.as_deref(), Some("bss-post-101"));
    assert!(older.content.is_none());
}

#[test]
fn atom_fixture_maps_entries_and_alternate_links() {
    let snap = parse_feed(RELEASES_ATOM).unwrap();

    assert_eq!(snap.title.as_deref(), Some("Game Client Releases"));
    assert_eq!(snap.items.len(), 2);

    let newest = &snap.items[0];
    assert_eq!(newest.guid.as_deref(), Some("urn:release:2.4.0"));
    assert_eq!(newest.title.as_deref(), Some("Client 2.4.0"));
    // rel="self" must lose to rel="alternate".
    assert_eq!(
        newest.link.as_deref(),
        Some("https://releases.example/notes/2.4.0")
    );
    assert_eq!(newest.published.as_deref(), Some("2025-12-20T09:30:00Z"));
    assert_eq!(
        newest.snippet.as_deref(),
        Some("Performance fixes and a new settings page.")
    );
    assert!(newest.content.as_deref().unwrap().contains("Full notes"));

    // A lone <link> without rel still counts as the alternate.
    let older = &snap.items[1];
    assert_eq!(
        older.link.as_deref(),
        Some("https://releases.example/notes/2.3.9")
    );
    assert!(older.content.is_none());
}
