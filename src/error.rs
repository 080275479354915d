// src/error.rs
//! Error taxonomy for the collection pipeline.
//!
//! Only `Config` is fatal (the run never starts). The rest are scoped:
//! a `Fetch` error skips one source/sort-method, a `Storage` error skips one
//! item, an `Item` error skips one item, and a `Task` error marks the day's
//! task failed without crashing the process. Nothing is retried in-run;
//! recovery is the idempotent skip-if-completed check on the next invocation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    /// Invalid configuration, e.g. per-source targets not summing to the
    /// daily target. Raised once at load.
    #[error("config error: {0}")]
    Config(String),

    /// A source was unreachable or rate-limited.
    #[error("fetch error for r/{subreddit} ({sort}): {message}")]
    Fetch {
        subreddit: String,
        sort: String,
        message: String,
    },

    /// A storage write failed (conflicts are reported as `Ok(false)` by the
    /// store, not as this variant).
    #[error("storage error: {0}")]
    Storage(String),

    /// Classifying/scoring one item blew up; the item is skipped.
    #[error("item processing error for {item_id}: {message}")]
    Item { item_id: String, message: String },

    /// Uncaught failure at the top of a run; the daily task is marked failed.
    #[error("task error: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, HarvestError>;

impl HarvestError {
    pub fn config(msg: impl Into<String>) -> Self {
        HarvestError::Config(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        HarvestError::Storage(msg.into())
    }
}
