// src/pipeline.rs
//! Daily collection orchestration: claims the day's task, allocates quota,
//! walks sources in priority order, and funnels surviving items through
//! filter → classifier → scorer → store.
//!
//! Single-threaded and sequential by design; the only guard against two
//! processes racing the same day is the `try_start` compare-and-set plus the
//! `(id, date)` dedup constraint at the store.

use crate::classify;
use crate::config::{CollectionConfig, SourceConfig};
use crate::error::HarvestError;
use crate::fetch::SourceFetcher;
use crate::filter;
use crate::quota::{self, CollectedSnapshot};
use crate::score;
use crate::store::{PostStore, SessionLog, TaskStore};
use crate::time_policy::{SortMethod, TimePolicy};
use crate::types::{Item, RunSummary, SessionRecord, StoredPost, TaskStatus};
use chrono::{NaiveDate, Timelike, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Listing page size requested per source/sort-method fetch.
const FETCH_LIMIT: u32 = 100;
/// At most this many extracted keywords are persisted per item.
const MAX_PERSISTED_KEYWORDS: usize = 20;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("harvest_fetched_total", "Items fetched from sources.");
        describe_counter!(
            "harvest_rejected_total",
            "Items rejected by the eligibility filter."
        );
        describe_counter!(
            "harvest_dedup_total",
            "Items skipped because today already stored them."
        );
        describe_counter!("harvest_stored_total", "Items persisted.");
        describe_counter!("harvest_fetch_errors_total", "Source fetch failures.");
        describe_counter!("harvest_runs_total", "Daily collection runs started.");
        describe_gauge!(
            "harvest_last_run_ts",
            "Unix ts when the last collection run finished."
        );
    });
}

#[derive(Default)]
struct RunStats {
    fetched: u64,
    processed: u64,
    stored: u64,
    api_calls: u64,
    sources_touched: Vec<String>,
    errors: Vec<String>,
}

pub struct Harvester {
    config: Arc<CollectionConfig>,
    policy: TimePolicy,
    fetcher: Arc<dyn SourceFetcher>,
    posts: Arc<dyn PostStore>,
    tasks: Arc<dyn TaskStore>,
    session_log: Arc<dyn SessionLog>,
}

impl Harvester {
    pub fn new(
        config: Arc<CollectionConfig>,
        fetcher: Arc<dyn SourceFetcher>,
        posts: Arc<dyn PostStore>,
        tasks: Arc<dyn TaskStore>,
        session_log: Arc<dyn SessionLog>,
    ) -> Self {
        Self {
            config,
            policy: TimePolicy::default(),
            fetcher,
            posts,
            tasks,
            session_log,
        }
    }

    pub fn with_policy(mut self, policy: TimePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &CollectionConfig {
        &self.config
    }

    /// Execute one daily collection run for "today" in the collection
    /// timezone. Idempotent: a completed day exits immediately, and a day
    /// claimed by another process is left alone.
    pub async fn run_daily(&self) -> Result<RunSummary, HarvestError> {
        ensure_metrics_described();

        let started = Instant::now();
        let now = Utc::now();
        let date = self.config.collection_date(now);
        let session_id = uuid::Uuid::new_v4().to_string();
        let mut stats = RunStats::default();

        info!(%date, session = %session_id, target = self.config.daily_target, "daily collection starting");

        self.tasks
            .create_if_absent(date, self.config.daily_target)
            .await?;

        // Sole recovery/resumption mechanism: a completed day is done, no
        // allocator, no fetches.
        if let Some(task) = self.tasks.get(date).await? {
            if task.status == TaskStatus::Completed {
                info!(%date, actual = task.actual_count, "day already completed, skipping");
                return self
                    .summary(&session_id, date, started, &stats, task.actual_count)
                    .await;
            }
        }

        // Atomic pending/failed → running claim; losing it means another
        // process owns the run.
        if !self.tasks.try_start(date).await? {
            info!(%date, "run already claimed by another worker, skipping");
            let today_total = self.posts.count_today(date).await.unwrap_or(0);
            return self.summary(&session_id, date, started, &stats, today_total).await;
        }

        counter!("harvest_runs_total").increment(1);

        match self.collect(date, &mut stats).await {
            Ok(final_count) => {
                self.tasks
                    .finish(date, TaskStatus::Completed, final_count, None)
                    .await?;
                gauge!("harvest_last_run_ts").set(now.timestamp() as f64);
                info!(%date, final_count, "daily collection completed");
                self.record_session(&session_id, date, &stats, TaskStatus::Completed)
                    .await;
                self.summary(&session_id, date, started, &stats, final_count).await
            }
            Err(e) => {
                // Task-level failure: mark the day failed, keep whatever
                // partial count landed before the error, don't crash.
                let partial = self.posts.count_today(date).await.unwrap_or(0);
                warn!(%date, error = %e, partial, "daily collection failed");
                if let Err(finish_err) = self
                    .tasks
                    .finish(date, TaskStatus::Failed, partial, Some(e.to_string()))
                    .await
                {
                    warn!(error = %finish_err, "could not mark task failed");
                }
                self.record_session(&session_id, date, &stats, TaskStatus::Failed)
                    .await;
                Err(HarvestError::Task(e.to_string()))
            }
        }
    }

    /// The allocation + collection loop. Returns the final stored count for
    /// the day.
    async fn collect(&self, date: NaiveDate, stats: &mut RunStats) -> Result<u32, HarvestError> {
        let snapshot = CollectedSnapshot {
            total: self.posts.count_today(date).await?,
            by_source: self.posts.count_today_by_source(date).await?,
        };
        let plan = quota::plan(self.config.daily_target, &self.config.sources, &snapshot);

        if plan.remaining_global == 0 {
            info!(%date, total = snapshot.total, "daily target already met");
            return Ok(snapshot.total);
        }
        info!(
            already = snapshot.total,
            remaining = plan.remaining_global,
            sources = plan.allocations.len(),
            "quota plan ready"
        );

        let mut total = snapshot.total;
        for alloc in &plan.allocations {
            // Global cap wins over per-source quota: clamp the allocation to
            // the remainder and stop once the target is reached.
            let remaining = self.config.daily_target.saturating_sub(total);
            if remaining == 0 {
                info!(total, "daily target reached, stopping early");
                break;
            }
            let needed = alloc.needed.min(remaining);

            let Some(source) = self.config.sources.iter().find(|s| s.name == alloc.source)
            else {
                continue;
            };

            stats.sources_touched.push(source.name.clone());
            let collected = self.collect_source(source, needed, date, stats).await;
            info!(source = %source.name, collected, needed, "source finished");

            // Per-source checkpoint against the store, not the local count.
            total = self.posts.count_today(date).await?;
        }

        Ok(total)
    }

    /// Collect up to `needed` items from one source, trying its sort
    /// methods in configured order. Fetch failures skip to the next sort
    /// method; item-level failures skip the item. Never fails the run.
    async fn collect_source(
        &self,
        source: &SourceConfig,
        needed: u32,
        date: NaiveDate,
        stats: &mut RunStats,
    ) -> u32 {
        let mut collected = 0u32;

        for sort in &source.sort_methods {
            if collected >= needed {
                break;
            }

            stats.api_calls += 1;
            let items = match self.fetcher.fetch(&source.name, *sort, FETCH_LIMIT).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(source = %source.name, sort = %sort, error = %e, "fetch failed, skipping sort method");
                    counter!("harvest_fetch_errors_total").increment(1);
                    stats.errors.push(e.to_string());
                    continue;
                }
            };
            stats.fetched += items.len() as u64;
            counter!("harvest_fetched_total").increment(items.len() as u64);

            for item in items {
                if collected >= needed {
                    break;
                }
                match self.process_item(&item, source, *sort, date).await {
                    Ok(true) => {
                        collected += 1;
                        stats.processed += 1;
                        stats.stored += 1;
                    }
                    Ok(false) => {}
                    Err(e) => {
                        // Item-scoped: log and move on.
                        let err = HarvestError::Item {
                            item_id: item.id.clone(),
                            message: e.to_string(),
                        };
                        warn!(error = %err, "item skipped");
                        stats.errors.push(err.to_string());
                    }
                }
            }
        }

        collected
    }

    /// Filter, classify, score, and persist one item. `Ok(true)` only when
    /// a new record was written.
    async fn process_item(
        &self,
        item: &Item,
        source: &SourceConfig,
        sort: SortMethod,
        date: NaiveDate,
    ) -> Result<bool, HarvestError> {
        let now_utc = Utc::now().timestamp();

        let relevance = match filter::check_eligibility(item, source, sort, &self.policy, now_utc) {
            Ok(rel) => rel,
            Err(rejection) => {
                debug!(item = %item.id, reason = %rejection, "rejected");
                counter!("harvest_rejected_total").increment(1);
                return Ok(false);
            }
        };

        // Dedup short-circuit before any scoring work.
        if self.posts.exists_today(&item.id, date).await? {
            counter!("harvest_dedup_total").increment(1);
            return Ok(false);
        }

        let classification = classify::classify(&item.title, &item.body);
        let quality = score::quality_score(
            item,
            relevance.related,
            relevance.matched_keywords.len(),
            now_utc,
        );

        let age_hours = (now_utc - item.created_utc) as f64 / 3600.0;
        let published_hour = chrono::DateTime::from_timestamp(item.created_utc, 0)
            .map(|dt| dt.hour())
            .unwrap_or(0);
        let decay = self.policy.decay_weight(age_hours, published_hour);
        let time_weighted = score::time_weighted_score(quality, decay);

        let post = StoredPost {
            item: item.clone(),
            source: source.name.clone(),
            collected_on: date,
            quality_score: quality,
            time_weighted_score: time_weighted,
            tech_relevance_score: score::tech_relevance_score(time_weighted),
            classification,
        };

        // The insert is the dedup enforcement point: `false` means a
        // concurrent writer got there first.
        if !self.posts.insert(&post).await? {
            counter!("harvest_dedup_total").increment(1);
            return Ok(false);
        }
        counter!("harvest_stored_total").increment(1);

        let keywords = classify::extract::extract_all(&item.title, &item.body);
        let capped = &keywords[..keywords.len().min(MAX_PERSISTED_KEYWORDS)];
        if let Err(e) = self.posts.insert_keywords(&item.id, capped).await {
            // Keyword metadata is best-effort; the post itself is stored.
            warn!(item = %item.id, error = %e, "keyword persistence failed");
        }

        debug!(item = %item.id, quality, time_weighted, "stored");
        Ok(true)
    }

    async fn record_session(
        &self,
        session_id: &str,
        date: NaiveDate,
        stats: &RunStats,
        status: TaskStatus,
    ) {
        let record = SessionRecord {
            session_id: session_id.to_string(),
            date,
            sources_touched: stats.sources_touched.clone(),
            total_fetched: stats.fetched,
            total_processed: stats.processed,
            total_stored: stats.stored,
            api_calls: stats.api_calls,
            status,
            errors: stats.errors.clone(),
        };
        if let Err(e) = self.session_log.record(&record).await {
            warn!(error = %e, "session log write failed");
        }
    }

    async fn summary(
        &self,
        session_id: &str,
        date: NaiveDate,
        started: Instant,
        stats: &RunStats,
        today_total: u32,
    ) -> Result<RunSummary, HarvestError> {
        let mut by_source: Vec<(String, u32)> = self
            .posts
            .count_today_by_source(date)
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();
        by_source.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Ok(RunSummary {
            session_id: session_id.to_string(),
            date,
            duration_secs: started.elapsed().as_secs_f64(),
            total_fetched: stats.fetched,
            total_processed: stats.processed,
            total_stored: stats.stored,
            api_calls: stats.api_calls,
            today_total,
            target: self.config.daily_target,
            by_source,
            errors: stats.errors.clone(),
        })
    }
}
