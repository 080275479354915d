// src/types.rs
//! Core data model: fetched items, classification output, daily task rows,
//! and the per-run summary.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One candidate content unit fetched from a source. Immutable once fetched;
/// the pipeline owns it for a single run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub body: String,
    pub score: i64,
    pub num_comments: i64,
    pub upvote_ratio: f64,
    /// Unix seconds (UTC).
    pub created_utc: i64,
    pub author: String,
    pub permalink: String,
    /// External link, if the item points outside the source.
    pub url: Option<String>,
    pub flags: ItemFlags,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemFlags {
    pub nsfw: bool,
    pub removed: bool,
    pub locked: bool,
}

/// Output of the rule-based content classifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Classification {
    pub primary_category: String,
    pub secondary_categories: Vec<String>,
    pub content_type: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub tech_stack: TechStack,
    pub application_domain: String,
    pub complexity_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TechStack {
    pub frameworks: Vec<String>,
    pub languages: Vec<String>,
    pub platforms: Vec<String>,
}

/// One extracted keyword with provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedKeyword {
    pub keyword: String,
    pub category: String,
    /// 0.0..=1.0
    pub confidence: f64,
    pub method: ExtractionMethod,
    pub frequency: u32,
    pub position: KeywordPosition,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Dictionary,
    Regex,
    Frequency,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum KeywordPosition {
    Title,
    Body,
}

/// Everything the store persists for one surviving item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPost {
    pub item: Item,
    pub source: String,
    pub collected_on: NaiveDate,
    pub quality_score: f64,
    pub time_weighted_score: f64,
    /// `min(10, time_weighted_score / 10)`, persisted for reporting.
    pub tech_relevance_score: f64,
    pub classification: Classification,
}

/// Lifecycle of one calendar day's collection run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per collection day (dates are in the collection timezone).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyTask {
    pub date: NaiveDate,
    pub target_count: u32,
    pub actual_count: u32,
    pub status: TaskStatus,
    pub started_at: Option<i64>,
    pub ended_at: Option<i64>,
    pub error_message: Option<String>,
}

impl DailyTask {
    pub fn new(date: NaiveDate, target_count: u32) -> Self {
        Self {
            date,
            target_count,
            actual_count: 0,
            status: TaskStatus::Pending,
            started_at: None,
            ended_at: None,
            error_message: None,
        }
    }
}

/// Best-effort crawl session record (write-only log).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub date: NaiveDate,
    pub sources_touched: Vec<String>,
    pub total_fetched: u64,
    pub total_processed: u64,
    pub total_stored: u64,
    pub api_calls: u64,
    pub status: TaskStatus,
    pub errors: Vec<String>,
}

/// What `run_daily` reports back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub session_id: String,
    pub date: NaiveDate,
    pub duration_secs: f64,
    pub total_fetched: u64,
    pub total_processed: u64,
    pub total_stored: u64,
    pub api_calls: u64,
    pub today_total: u32,
    pub target: u32,
    pub by_source: Vec<(String, u32)>,
    pub errors: Vec<String>,
}
