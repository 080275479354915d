// src/store/mod.rs
//! Collaborator contracts the pipeline depends on: the dedup/storage store,
//! the daily-task state store, and the best-effort session log.

pub mod d1;
pub mod memory;

use crate::error::HarvestError;
use crate::types::{DailyTask, ExtractedKeyword, SessionRecord, StoredPost, TaskStatus};
use chrono::NaiveDate;
use std::collections::HashMap;

/// Dedup/storage store. Uniqueness is scoped to `(item id, collection
/// date)`: an id may recur on a later date, never twice on the same one.
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    async fn exists_today(&self, item_id: &str, date: NaiveDate) -> Result<bool, HarvestError>;

    /// Returns `false` on a dedup conflict (the enforcement point), `true`
    /// when the record was written.
    async fn insert(&self, post: &StoredPost) -> Result<bool, HarvestError>;

    async fn insert_keywords(
        &self,
        item_id: &str,
        keywords: &[ExtractedKeyword],
    ) -> Result<u32, HarvestError>;

    async fn count_today(&self, date: NaiveDate) -> Result<u32, HarvestError>;

    async fn count_today_by_source(
        &self,
        date: NaiveDate,
    ) -> Result<HashMap<String, u32>, HarvestError>;
}

/// Daily-task state store. One row per collection day.
#[async_trait::async_trait]
pub trait TaskStore: Send + Sync {
    /// Idempotent insert-if-absent; the row starts `pending`.
    async fn create_if_absent(&self, date: NaiveDate, target: u32) -> Result<(), HarvestError>;

    /// Atomic compare-and-set `pending`/`failed` → `running`. `false` means
    /// another process holds the run or the day is already complete; the
    /// caller must not start fetching.
    async fn try_start(&self, date: NaiveDate) -> Result<bool, HarvestError>;

    async fn finish(
        &self,
        date: NaiveDate,
        status: TaskStatus,
        actual_count: u32,
        error_message: Option<String>,
    ) -> Result<(), HarvestError>;

    async fn get(&self, date: NaiveDate) -> Result<Option<DailyTask>, HarvestError>;
}

/// Write-only crawl session log; failures are logged and ignored.
#[async_trait::async_trait]
pub trait SessionLog: Send + Sync {
    async fn record(&self, session: &SessionRecord) -> Result<(), HarvestError>;
}
