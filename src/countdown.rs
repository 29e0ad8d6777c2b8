// src/countdown.rs
//! In-game event countdown: find "<event> ends <date>" phrases in post text,
//! parse the messy human dates the blog uses, and render the remaining time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};

use crate::config::Config;
use crate::store::StoreDoc;

/// Scan post text for "<event> ends [on] <date-ish tail>" and parse the tail.
/// The capture window is bounded (6..=40 chars) and cut at the first sentence
/// punctuation. A comma is ambiguous ("January 5, 2026" vs a trailing clause),
/// so the uncut tail is tried first and the comma cut second.
pub fn extract_event_end(event_name: &str, text: &str) -> Option<DateTime<Utc>> {
    let pattern = format!(
        r"(?i)\b{}\s+ends?\s+(?:on\s+)?(.{{6,40}})",
        regex::escape(event_name)
    );
    let re = regex::Regex::new(&pattern).ok()?;
    let caps = re.captures(text)?;
    let mut guess = caps.get(1)?.as_str().to_string();
    if let Some(i) = guess.find(['.', '!', ')', ']']) {
        guess.truncate(i);
    }
    parse_flexible_date(&guess).or_else(|| {
        let head = match guess.find(',') {
            Some(i) => &guess[..i],
            None => return None,
        };
        parse_flexible_date(head)
    })
}

/// Parse a date phrase into UTC. The sources are not consistent, so a handful
/// of formats are tried in order; date-only forms resolve to midnight UTC.
pub fn parse_flexible_date(s: &str) -> Option<DateTime<Utc>> {
    let t = s.trim();
    if t.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(t) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(t) {
        return Some(dt.with_timezone(&Utc));
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%B %d %Y %H:%M",
        "%b %d %Y %H:%M",
    ];
    for f in DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(t, f) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    const DATE_FORMATS: &[&str] = &[
        "%B %d %Y", // January 5 2026
        "%b %d %Y", // Jan 5 2026
        "%d %B %Y", // 5 January 2026
        "%Y-%m-%d",
        "%m/%d/%Y",
    ];
    let no_commas = t.replace(',', "");
    for f in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(no_commas.trim(), f) {
            return d
                .and_hms_opt(0, 0, 0)
                .map(|ndt| Utc.from_utc_datetime(&ndt));
        }
    }
    None
}

/// The end date to render: what the feeds told us, else the configured
/// fallback, else nothing.
pub fn effective_end(
    stored_iso: Option<&str>,
    fallback_iso: Option<&str>,
) -> Option<DateTime<Utc>> {
    stored_iso
        .and_then(parse_flexible_date)
        .or_else(|| fallback_iso.and_then(parse_flexible_date))
}

/// Rendering used for the store field.
pub fn to_store_iso(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// The countdown line for the current store + config, or `None` when no end
/// date is known from either.
pub fn countdown_line(cfg: &Config, store: &StoreDoc, now: DateTime<Utc>) -> Option<String> {
    let end = effective_end(
        store.event_end_iso.as_deref(),
        cfg.event_end_fallback.as_deref(),
    )?;
    Some(format_countdown(&cfg.event_name, end, now))
}

/// One-line countdown string, same shape the bot always posted.
pub fn format_countdown(event_name: &str, end: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let left = end - now;
    if left <= chrono::Duration::zero() {
        return format!("{event_name} has ended");
    }
    let mins_total = left.num_minutes();
    let days = mins_total / (24 * 60);
    let hours = (mins_total / 60) % 24;
    let mins = mins_total % 60;
    format!("{event_name} ends in {days}d {hours}h {mins}m")
}
