// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod classify;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod metrics;
pub mod pipeline;
pub mod quota;
pub mod report;
pub mod scheduler;
pub mod score;
pub mod store;
pub mod time_policy;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::{CollectionConfig, SourceConfig};
pub use crate::error::HarvestError;
pub use crate::pipeline::Harvester;
pub use crate::time_policy::{SortMethod, TimePolicy};
pub use crate::types::{DailyTask, Item, RunSummary, StoredPost, TaskStatus};
