// src/summarize/protocol.rs
//! The three-label protocol the model is told to follow, and its tolerant
//! parser. Models drift, so the parser accepts bare lines inside a section
//! and degrades to raw text when no label shows up at all.

/// Rendered `whats_new` cap, chars.
pub const WHATS_NEW_CAP: usize = 900;
/// Rendered `most_important` / `notes` cap, chars.
pub const SECTION_CAP: usize = 450;
/// Raw-text degradation keeps at most this many chars.
const RAW_FALLBACK_CAP: usize = 400;

/// Bullet lists per section, before rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummarySections {
    pub whats_new: Vec<String>,
    pub most_important: Vec<String>,
    pub notes: Vec<String>,
}

/// Per-section bulleted text, each capped and ready for a chat embed field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedSummary {
    pub whats_new: String,
    pub most_important: String,
    pub notes: String,
}

/// Line scan over the model output. Label lines (case-insensitive prefixes
/// `WHATS_NEW:` / `MOST_IMPORTANT:` / `NOTES:`) switch the active section and
/// contribute no content themselves. `-` bullets lose the marker; bare
/// non-empty lines join the active section; lines before any label are
/// dropped. When no label matched at all, the raw text itself becomes the
/// what's-new section, capped.
pub fn parse_sections(summary: &str) -> SummarySections {
    #[derive(Clone, Copy)]
    enum Section {
        WhatsNew,
        MostImportant,
        Notes,
    }

    let mut out = SummarySections::default();
    let mut current: Option<Section> = None;
    let mut matched_any = false;

    for raw_line in summary.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let upper = line.to_uppercase();
        if upper.starts_with("WHATS_NEW:") {
            current = Some(Section::WhatsNew);
            matched_any = true;
            continue;
        }
        if upper.starts_with("MOST_IMPORTANT:") {
            current = Some(Section::MostImportant);
            matched_any = true;
            continue;
        }
        if upper.starts_with("NOTES:") {
            current = Some(Section::Notes);
            matched_any = true;
            continue;
        }
        let Some(section) = current else { continue };
        let item = line.strip_prefix('-').map(str::trim).unwrap_or(line);
        if item.is_empty() {
            continue;
        }
        let bucket = match section {
            Section::WhatsNew => &mut out.whats_new,
            Section::MostImportant => &mut out.most_important,
            Section::Notes => &mut out.notes,
        };
        bucket.push(item.to_string());
    }

    if !matched_any {
        let trimmed = summary.trim();
        if !trimmed.is_empty() {
            out.whats_new = vec![char_prefix(trimmed, RAW_FALLBACK_CAP)];
        }
    }
    out
}

/// One `• item` per line, hard cap per section with a `…` truncation marker.
pub fn render(sections: &SummarySections) -> RenderedSummary {
    RenderedSummary {
        whats_new: bullets_capped(&sections.whats_new, WHATS_NEW_CAP),
        most_important: bullets_capped(&sections.most_important, SECTION_CAP),
        notes: bullets_capped(&sections.notes, SECTION_CAP),
    }
}

pub fn parse_and_render(summary: &str) -> RenderedSummary {
    render(&parse_sections(summary))
}

fn bullets_capped(items: &[String], cap: usize) -> String {
    let joined = items
        .iter()
        .map(|x| format!("• {x}"))
        .collect::<Vec<_>>()
        .join("\n");
    if joined.chars().count() > cap {
        let mut cut: String = joined.chars().take(cap.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        joined
    }
}

fn char_prefix(s: &str, cap: usize) -> String {
    if s.chars().count() > cap {
        s.chars().take(cap).collect()
    } else {
        s.to_string()
    }
}
