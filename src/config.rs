// src/config.rs
//! Collection configuration: the ordered source table, the global daily
//! target, and load/validate plumbing.
//!
//! Sources are an *ordered* list; the pipeline visits them in this priority
//! order. `validate` enforces the quota invariant (per-source targets must
//! sum to the daily target) once at startup, never as a load-time side
//! effect.

use crate::error::HarvestError;
use crate::time_policy::SortMethod;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_PATH: &str = "HARVEST_CONFIG_PATH";
pub const ENV_DAILY_TARGET: &str = "DAILY_TARGET_POSTS";
pub const ENV_COLLECTION_HOUR: &str = "COLLECTION_HOUR";

const DEFAULT_CONFIG_PATH: &str = "config/harvester.toml";

/// One named subreddit with its share of the daily target.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SourceConfig {
    pub name: String,
    /// Trust/priority weight in [0, 1].
    pub weight: f64,
    pub min_score: i64,
    pub min_comments: i64,
    pub target_posts: u32,
    pub sort_methods: Vec<SortMethod>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionConfig {
    pub daily_target: u32,
    /// Hour of day (collection timezone) at which the scheduler fires.
    #[serde(default = "default_collection_hour")]
    pub collection_hour: u32,
    /// Collection timezone as a fixed UTC offset in hours (UTC+8, no DST).
    #[serde(default = "default_tz_offset_hours")]
    pub tz_offset_hours: i32,
    /// Run-level retry budget used by the scheduler. Individual fetch or
    /// storage failures inside a run skip and continue instead.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
    pub sources: Vec<SourceConfig>,
}

fn default_collection_hour() -> u32 {
    6
}
fn default_tz_offset_hours() -> i32 {
    8
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_interval_secs() -> u64 {
    300
}

impl CollectionConfig {
    /// Check the quota invariant and basic ranges. Call once at startup;
    /// a violation is fatal, the run never starts.
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.sources.is_empty() {
            return Err(HarvestError::config("source list is empty"));
        }
        let sum: u32 = self.sources.iter().map(|s| s.target_posts).sum();
        if sum != self.daily_target {
            return Err(HarvestError::config(format!(
                "per-source targets sum to {} but daily_target is {}",
                sum, self.daily_target
            )));
        }
        if self.collection_hour > 23 {
            return Err(HarvestError::config(format!(
                "collection_hour {} out of range",
                self.collection_hour
            )));
        }
        for s in &self.sources {
            if !(0.0..=1.0).contains(&s.weight) {
                return Err(HarvestError::config(format!(
                    "source {} has weight {} outside [0, 1]",
                    s.name, s.weight
                )));
            }
            if s.sort_methods.is_empty() {
                return Err(HarvestError::config(format!(
                    "source {} has no sort methods",
                    s.name
                )));
            }
        }
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self, HarvestError> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarvestError::config(format!("reading config from {}: {e}", path.display()))
        })?;
        let cfg: CollectionConfig = toml::from_str(&content)
            .map_err(|e| HarvestError::config(format!("parsing {}: {e}", path.display())))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load order: $HARVEST_CONFIG_PATH, `config/harvester.toml`, built-in
    /// seed. `DAILY_TARGET_POSTS` / `COLLECTION_HOUR` env vars override the
    /// loaded values (target overrides re-check the quota invariant).
    pub fn load_default() -> Result<Self, HarvestError> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(HarvestError::config(
                    "HARVEST_CONFIG_PATH points to non-existent path",
                ));
            }
            Self::load_from(&pb)?
        } else {
            let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default_p.exists() {
                Self::load_from(&default_p)?
            } else {
                Self::default_seed()
            }
        };

        if let Some(hour) = parse_env_u32(ENV_COLLECTION_HOUR) {
            cfg.collection_hour = hour;
        }
        if let Some(target) = parse_env_u32(ENV_DAILY_TARGET) {
            cfg.daily_target = target;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn tz_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.tz_offset_hours * 3600).expect("tz offset in range")
    }

    /// Collection date for a given instant, in the collection timezone.
    pub fn collection_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz_offset()).date_naive()
    }

    /// Built-in source table: 16 AI subreddits, per-source targets summing
    /// to the 200/day target. Tiered by community size and signal quality.
    pub fn default_seed() -> Self {
        let src = |name: &str,
                   weight: f64,
                   min_score: i64,
                   min_comments: i64,
                   target_posts: u32,
                   sorts: &[SortMethod]| SourceConfig {
            name: name.to_string(),
            weight,
            min_score,
            min_comments,
            target_posts,
            sort_methods: sorts.to_vec(),
        };
        use SortMethod::{Hot, New, Rising, Top};

        CollectionConfig {
            daily_target: 200,
            collection_hour: 6,
            tz_offset_hours: 8,
            max_retries: 3,
            retry_interval_secs: 300,
            sources: vec![
                // Tier 1: core communities
                src("ChatGPT", 1.0, 30, 5, 45, &[Hot, Top]),
                src("LocalLLaMA", 0.9, 30, 5, 30, &[Hot, Rising]),
                src("StableDiffusion", 0.8, 20, 3, 20, &[Hot, Top]),
                src("singularity", 0.8, 15, 3, 15, &[Hot, Top]),
                src("artificial", 0.7, 15, 2, 20, &[Hot, Top, New]),
                // Tier 2: specialist communities
                src("MachineLearning", 0.7, 10, 1, 12, &[Hot, Top, New]),
                src("deeplearning", 0.7, 8, 1, 12, &[Hot, Top, New, Rising]),
                src("computervision", 0.6, 15, 2, 8, &[Hot, Top]),
                src("NLP", 0.6, 5, 1, 8, &[Hot, Top, New]),
                src("MLPapers", 0.6, 3, 1, 8, &[Hot, New, Rising]),
                // Tier 3: frontier / niche
                src("agi", 0.5, 10, 2, 6, &[Hot, Top]),
                src("neuralnetworks", 0.5, 3, 1, 3, &[Hot, New, Rising]),
                src("datasets", 0.4, 2, 1, 4, &[Hot, New, Rising]),
                src("voiceai", 0.4, 2, 1, 4, &[Hot, Top, New]),
                src("MediaSynthesis", 0.4, 2, 1, 2, &[Hot, New, Rising]),
                src("GPT3", 0.5, 3, 1, 3, &[Hot, Top, New]),
            ],
        }
    }
}

fn parse_env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn seed_satisfies_quota_invariant() {
        let cfg = CollectionConfig::default_seed();
        cfg.validate().unwrap();
        let sum: u32 = cfg.sources.iter().map(|s| s.target_posts).sum();
        assert_eq!(sum, 200);
        assert_eq!(cfg.daily_target, 200);
    }

    #[test]
    fn quota_sum_mismatch_is_fatal() {
        let mut cfg = CollectionConfig::default_seed();
        cfg.sources[0].target_posts += 1;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("daily_target"));
    }

    #[test]
    fn collection_date_uses_utc_plus_8() {
        let cfg = CollectionConfig::default_seed();
        // 23:00 UTC on Jan 1 is already Jan 2 in UTC+8.
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 23, 0, 0).unwrap();
        assert_eq!(
            cfg.collection_date(now),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
        );
        let earlier = Utc.with_ymd_and_hms(2025, 1, 1, 15, 0, 0).unwrap();
        assert_eq!(
            cfg.collection_date(earlier),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
    }

    const SAMPLE_TOML: &str = r#"
daily_target = 10

[[sources]]
name = "ChatGPT"
weight = 1.0
min_score = 30
min_comments = 5
target_posts = 6
sort_methods = ["hot", "top"]

[[sources]]
name = "NLP"
weight = 0.6
min_score = 5
min_comments = 1
target_posts = 4
sort_methods = ["new"]
"#;

    #[test]
    fn toml_defaults_fill_missing_fields() {
        let cfg: CollectionConfig = toml::from_str(SAMPLE_TOML).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.collection_hour, 6);
        assert_eq!(cfg.sources[0].sort_methods, vec![SortMethod::Hot, SortMethod::Top]);
    }

    #[test]
    fn load_from_reads_and_validates_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harvester.toml");
        std::fs::write(&path, SAMPLE_TOML).unwrap();

        let cfg = CollectionConfig::load_from(&path).unwrap();
        assert_eq!(cfg.daily_target, 10);
        assert_eq!(cfg.sources.len(), 2);

        let missing = CollectionConfig::load_from(&dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(HarvestError::Config(_))));
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_re_validate() {
        std::env::remove_var(ENV_CONFIG_PATH);
        std::env::set_var(ENV_DAILY_TARGET, "150");
        // Seed targets sum to 200, so a 150 override must fail validation.
        let err = CollectionConfig::load_default().unwrap_err();
        assert!(matches!(err, HarvestError::Config(_)));
        std::env::remove_var(ENV_DAILY_TARGET);
    }
}
