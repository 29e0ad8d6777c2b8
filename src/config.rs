// src/config.rs
//! Runtime configuration: a small TOML file for the polling setup plus a few
//! environment variables for secrets and the HTTP port.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const ENV_PATH: &str = "NOTIFIER_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/notifier.toml";

fn default_poll_minutes() -> u64 {
    5
}
fn default_event_name() -> String {
    "Beesmas".to_string()
}
fn default_summary_model() -> String {
    "gpt-4o-mini".to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Ordered feed URLs; polled strictly in this order.
    #[serde(default)]
    pub feeds: Vec<String>,
    #[serde(default = "default_poll_minutes")]
    pub poll_minutes: u64,
    /// Event whose "ends <date>" phrases get scanned out of post text.
    #[serde(default = "default_event_name")]
    pub event_name: String,
    /// Countdown fallback when no end date was ever extracted from a post.
    #[serde(default)]
    pub event_end_fallback: Option<String>,
    #[serde(default = "default_summary_model")]
    pub summary_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            poll_minutes: default_poll_minutes(),
            event_name: default_event_name(),
            event_end_fallback: None,
            summary_model: default_summary_model(),
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let mut cfg: Config =
            toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
        cfg.feeds = clean_feed_list(cfg.feeds);
        if cfg.poll_minutes == 0 {
            cfg.poll_minutes = default_poll_minutes();
        }
        Ok(cfg)
    }

    /// Load using `$NOTIFIER_CONFIG_PATH`, else `config/notifier.toml`, else
    /// built-in defaults (no feeds configured, so passes find nothing to do).
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            anyhow::bail!("NOTIFIER_CONFIG_PATH points to a non-existent path");
        }
        let default = PathBuf::from(DEFAULT_PATH);
        if default.exists() {
            return Self::load_from_file(&default);
        }
        Ok(Config::default())
    }
}

/// Trim entries, drop empties, dedup while keeping the configured order.
fn clean_feed_list(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if !t.is_empty() && seen.insert(t.to_string()) {
            out.push(t.to_string());
        }
    }
    out
}

/// Strip the quotes and whitespace people paste around env secrets. A value
/// with interior whitespace is treated as absent.
pub fn clean_secret(raw: &str) -> Option<String> {
    let t = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if t.is_empty() || t.chars().any(char::is_whitespace) {
        return None;
    }
    Some(t.to_string())
}

pub fn openai_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY")
        .ok()
        .as_deref()
        .and_then(clean_secret)
}

/// Port for the health/metrics server.
pub fn http_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

/// Presence-only snapshot of the environment for startup logs. Never values.
pub fn log_env_presence() {
    tracing::info!(
        openai_key = openai_api_key().is_some(),
        summary_test_mode = std::env::var("SUMMARY_TEST_MODE").is_ok(),
        store_path = std::env::var("STORE_PATH").is_ok(),
        "environment probed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;

    #[test]
    fn partial_toml_gets_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"feeds = ["https://a/feed", " ", "https://a/feed"]"#).unwrap();
        let cfg = Config::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.feeds, vec!["https://a/feed".to_string()]);
        assert_eq!(cfg.poll_minutes, 5);
        assert_eq!(cfg.event_name, "Beesmas");
        assert_eq!(cfg.summary_model, "gpt-4o-mini");
        assert!(cfg.event_end_fallback.is_none());
    }

    #[test]
    fn zero_poll_minutes_is_normalized() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "poll_minutes = 0").unwrap();
        let cfg = Config::load_from_file(f.path()).unwrap();
        assert_eq!(cfg.poll_minutes, 5);
    }

    #[test]
    fn feed_order_is_preserved() {
        let cleaned = clean_feed_list(vec![
            " https://b/feed ".into(),
            "https://a/feed".into(),
            "https://b/feed".into(),
        ]);
        assert_eq!(cleaned, vec!["https://b/feed", "https://a/feed"]);
    }

    #[test]
    fn clean_secret_strips_pasted_junk() {
        assert_eq!(clean_secret("\"sk-abc\""), Some("sk-abc".to_string()));
        assert_eq!(clean_secret("'sk-abc'"), Some("sk-abc".to_string()));
        assert_eq!(clean_secret("  sk-abc  "), Some("sk-abc".to_string()));
        assert_eq!(clean_secret("sk abc"), None);
        assert_eq!(clean_secret("   "), None);
        assert_eq!(clean_secret("\"\""), None);
    }

    #[serial_test::serial]
    #[test]
    fn http_port_reads_env() {
        env::remove_var("PORT");
        assert_eq!(http_port(), 3000);
        env::set_var("PORT", "8088");
        assert_eq!(http_port(), 8088);
        env::set_var("PORT", "not a port");
        assert_eq!(http_port(), 3000);
        env::remove_var("PORT");
    }

    #[serial_test::serial]
    #[test]
    fn load_default_honors_env_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, r#"feeds = ["https://x/feed"]"#).unwrap();
        env::set_var(ENV_PATH, f.path().display().to_string());
        let cfg = Config::load_default().unwrap();
        assert_eq!(cfg.feeds, vec!["https://x/feed".to_string()]);

        env::set_var(ENV_PATH, "/definitely/not/here.toml");
        assert!(Config::load_default().is_err());
        env::remove_var(ENV_PATH);
    }
}
