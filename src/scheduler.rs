// src/scheduler.rs
//! Long-running schedule loop: a one-minute ticker that fires the daily
//! collection once per day at the configured hour (collection timezone).
//! A liveness check on the worker handle keeps a second in-process run from
//! starting while one is active; the store-side claim guards across
//! processes.

use crate::config::CollectionConfig;
use crate::pipeline::Harvester;
use crate::report::ReportSender;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Timelike, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const TICK_SECS: u64 = 60;

/// Next time the daily collection is due, in the collection timezone.
pub fn next_collection_time(
    config: &CollectionConfig,
    now: DateTime<Utc>,
) -> DateTime<FixedOffset> {
    let tz = config.tz_offset();
    let local = now.with_timezone(&tz);
    let today_fire = tz
        .with_ymd_and_hms(
            local.year(),
            local.month(),
            local.day(),
            config.collection_hour,
            0,
            0,
        )
        .single()
        .unwrap_or(local);
    if local < today_fire {
        today_fire
    } else {
        today_fire + chrono::Duration::days(1)
    }
}

fn due_now(config: &CollectionConfig, now: DateTime<Utc>) -> bool {
    now.with_timezone(&config.tz_offset()).hour() == config.collection_hour
}

/// Spawn the schedule loop. Each due day gets one worker task; on failure
/// the worker retries up to `max_retries` with `retry_interval_secs`
/// between attempts, then gives up until the next day (the failed task row
/// stays claimable).
pub fn spawn_daily_scheduler(
    harvester: Arc<Harvester>,
    reporter: Option<Arc<ReportSender>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(TICK_SECS));
        let mut worker: Option<JoinHandle<()>> = None;
        let mut last_fired: Option<NaiveDate> = None;

        info!(
            next = %next_collection_time(harvester.config(), Utc::now()),
            "scheduler started"
        );

        loop {
            ticker.tick().await;

            if let Some(handle) = &worker {
                if !handle.is_finished() {
                    continue;
                }
                worker = None;
            }

            let now = Utc::now();
            let today = harvester.config().collection_date(now);
            if !due_now(harvester.config(), now) || last_fired == Some(today) {
                continue;
            }

            last_fired = Some(today);
            let h = harvester.clone();
            let r = reporter.clone();
            worker = Some(tokio::spawn(async move {
                run_with_retries(h, r).await;
            }));
        }
    })
}

async fn run_with_retries(harvester: Arc<Harvester>, reporter: Option<Arc<ReportSender>>) {
    let max_retries = harvester.config().max_retries;
    let retry_interval = Duration::from_secs(harvester.config().retry_interval_secs);

    for attempt in 1..=max_retries.max(1) {
        match harvester.run_daily().await {
            Ok(summary) => {
                info!(
                    date = %summary.date,
                    stored = summary.total_stored,
                    today_total = summary.today_total,
                    "scheduled run finished"
                );
                if let Some(reporter) = &reporter {
                    if let Err(e) = reporter.send_daily_report(&summary).await {
                        warn!(error = %e, "daily report email failed");
                    }
                }
                return;
            }
            Err(e) if attempt < max_retries => {
                warn!(attempt, error = %e, "scheduled run failed, retrying");
                tokio::time::sleep(retry_interval).await;
            }
            Err(e) => {
                warn!(attempt, error = %e, "scheduled run failed, giving up until next day");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> CollectionConfig {
        CollectionConfig::default_seed()
    }

    #[test]
    fn next_fire_is_today_before_the_hour() {
        // 2025-03-01 04:30 UTC+8 (20:30 UTC the day before), fire hour 6.
        let now = Utc.with_ymd_and_hms(2025, 2, 28, 20, 30, 0).unwrap();
        let next = next_collection_time(&cfg(), now);
        assert_eq!(next.hour(), 6);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn next_fire_rolls_to_tomorrow_after_the_hour() {
        // 2025-03-01 07:10 UTC+8.
        let now = Utc.with_ymd_and_hms(2025, 2, 28, 23, 10, 0).unwrap();
        let next = next_collection_time(&cfg(), now);
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2025, 3, 2).unwrap());
    }

    #[test]
    fn due_only_during_the_collection_hour() {
        // 06:xx local is due, 05:xx and 07:xx are not.
        assert!(due_now(&cfg(), Utc.with_ymd_and_hms(2025, 2, 28, 22, 5, 0).unwrap()));
        assert!(!due_now(&cfg(), Utc.with_ymd_and_hms(2025, 2, 28, 21, 59, 0).unwrap()));
        assert!(!due_now(&cfg(), Utc.with_ymd_and_hms(2025, 2, 28, 23, 0, 0).unwrap()));
    }
}
