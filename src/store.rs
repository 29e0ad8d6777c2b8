// src/store.rs
//! JSON-backed persistent store. One document holds the per-feed last-seen
//! identifiers, the summary cache, and a couple of scalar fields. Fields we do
//! not own (other parts of the bot keep their data here too) round-trip
//! untouched through `extra`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tokio::fs;

pub const DEFAULT_STORE_PATH: &str = "data.json";

/// The whole persisted document. Loaded fully before a polling pass, saved
/// fully once after it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreDoc {
    /// Feed URL -> identifier of the newest item already seen there.
    /// Entries are created on first observation and never deleted.
    #[serde(default)]
    pub last_guids: BTreeMap<String, String>,
    /// Summary cache: stable post identity -> summary text, kept forever.
    #[serde(default)]
    pub summaries: BTreeMap<String, String>,
    /// RFC 3339 end of the announced in-game event, when one was extracted.
    #[serde(default)]
    pub event_end_iso: Option<String>,
    /// Chat message id of the countdown post, kept so it can be edited in place.
    #[serde(default)]
    pub countdown_message_id: Option<String>,
    /// Everything else in the file. Preserved verbatim across load/save.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Handle bound to one store file on disk.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path from `STORE_PATH`, falling back to `data.json` next to the binary.
    pub fn from_env() -> Self {
        let path = std::env::var("STORE_PATH").unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file is a fresh start; a corrupt file is
    /// logged and counted, then also treated as fresh (the tables rebuild on
    /// the next passes, at the cost of re-announcing).
    pub async fn load(&self) -> StoreDoc {
        match fs::read_to_string(&self.path).await {
            Ok(s) => match serde_json::from_str(&s) {
                Ok(doc) => doc,
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        path = %self.path.display(),
                        "store file unreadable, starting with an empty document"
                    );
                    counter!("store_load_errors_total").increment(1);
                    StoreDoc::default()
                }
            },
            Err(_) => StoreDoc::default(),
        }
    }

    /// Write the whole document atomically: temp file in the same directory,
    /// then rename over the target.
    pub async fn save(&self, doc: &StoreDoc) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)
                    .await
                    .with_context(|| format!("create store dir {}", dir.display()))?;
            }
        }
        let json = serde_json::to_vec_pretty(doc).context("serialize store document")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("rename into {}", self.path.display()))?;
        Ok(())
    }
}
