// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod config;
pub mod countdown;
pub mod enrich;
pub mod feeds;
pub mod metrics;
pub mod novelty;
pub mod pipeline;
pub mod scheduler;
pub mod store;
pub mod summarize;

// ---- Re-exports for stable public API ----
pub use crate::novelty::Post;
pub use crate::pipeline::{PassOutcome, SummarizedPost, UpdatePipeline};
pub use crate::store::{JsonStore, StoreDoc};

/// User-agent sent by every outbound HTTP client in the crate.
pub const USER_AGENT: &str = "bss-update-notifier/0.1 (+github.com/lumlich/bss-update-notifier)";
