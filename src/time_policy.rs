// src/time_policy.rs
//! Age buckets, per-sort-method acceptance windows, and the recency/peak-hour
//! decay weight.
//!
//! All boundaries are half-open: an item exactly 6.0 hours old falls into
//! the `6-24h` bucket, not `0-6h`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Listing sort order requested from a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMethod {
    Hot,
    Top,
    New,
    Rising,
}

impl SortMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMethod::Hot => "hot",
            SortMethod::Top => "top",
            SortMethod::New => "new",
            SortMethod::Rising => "rising",
        }
    }
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(SortMethod::Hot),
            "top" => Ok(SortMethod::Top),
            "new" => Ok(SortMethod::New),
            "rising" => Ok(SortMethod::Rising),
            other => Err(format!("unknown sort method: {other}")),
        }
    }
}

/// Discrete age-of-item classification used for windowing and decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeBucket {
    Hours0To6,
    Hours6To24,
    Days1To3,
    Days3To7,
    Days7To30,
    TooOld,
}

impl AgeBucket {
    pub fn label(&self) -> &'static str {
        match self {
            AgeBucket::Hours0To6 => "0-6h",
            AgeBucket::Hours6To24 => "6-24h",
            AgeBucket::Days1To3 => "1-3d",
            AgeBucket::Days3To7 => "3-7d",
            AgeBucket::Days7To30 => "7-30d",
            AgeBucket::TooOld => "too_old",
        }
    }

    /// Recency multiplier for this bucket. `too_old` decays to zero and is
    /// excluded from collection entirely.
    pub fn recency_weight(&self) -> f64 {
        match self {
            AgeBucket::Hours0To6 => 1.2,
            AgeBucket::Hours6To24 => 1.1,
            AgeBucket::Days1To3 => 1.0,
            AgeBucket::Days3To7 => 0.9,
            AgeBucket::Days7To30 => 0.8,
            AgeBucket::TooOld => 0.0,
        }
    }
}

pub fn age_bucket(age_hours: f64) -> AgeBucket {
    let age_days = age_hours / 24.0;
    if age_hours < 6.0 {
        AgeBucket::Hours0To6
    } else if age_hours < 24.0 {
        AgeBucket::Hours6To24
    } else if age_days < 3.0 {
        AgeBucket::Days1To3
    } else if age_days < 7.0 {
        AgeBucket::Days3To7
    } else if age_days < 30.0 {
        AgeBucket::Days7To30
    } else {
        AgeBucket::TooOld
    }
}

/// Global and per-hour time policy. All hour-of-day values are UTC, the
/// source's native timezone.
#[derive(Debug, Clone, Deserialize)]
pub struct TimePolicy {
    /// Items younger than this have not accrued enough signal yet.
    pub min_age_hours: f64,
    /// Stale content past this is dropped regardless of sort method.
    pub max_age_days: f64,
    /// Hours of day at which quality content tends to be published.
    pub peak_hours: Vec<u32>,
    pub peak_multiplier: f64,
    pub normal_multiplier: f64,
    /// Declared third tier; the decay algorithm only distinguishes peak vs.
    /// normal hours, so this is currently unused.
    pub off_hours_multiplier: f64,
}

impl Default for TimePolicy {
    fn default() -> Self {
        Self {
            min_age_hours: 2.0,
            max_age_days: 30.0,
            peak_hours: vec![9, 10, 11, 14, 15, 16, 20, 21, 22],
            peak_multiplier: 1.3,
            normal_multiplier: 1.0,
            off_hours_multiplier: 0.9,
        }
    }
}

impl TimePolicy {
    /// Check the acceptance window for `sort`. `Err` carries a
    /// human-readable rejection reason (diagnostic only, never retried).
    pub fn is_within_window(&self, age_hours: f64, sort: SortMethod) -> Result<(), String> {
        let age_days = age_hours / 24.0;

        // Per-sort maximum first: hot looks back 3 days, top is tied to the
        // weekly lookback, new/rising only make sense for fresh items.
        let (max_hours, min_hours) = match sort {
            SortMethod::Hot => (3.0 * 24.0, self.min_age_hours),
            SortMethod::Top => (7.0 * 24.0, self.min_age_hours),
            SortMethod::New => (24.0, 1.0),
            SortMethod::Rising => (12.0, 1.0),
        };
        if age_hours > max_hours {
            if max_hours >= 48.0 {
                return Err(format!("too old for {sort}: {:.1} days", age_days));
            }
            return Err(format!("too old for {sort}: {:.1} hours", age_hours));
        }
        if age_days > self.max_age_days {
            return Err(format!("too old: {:.1} days", age_days));
        }
        if age_hours < min_hours {
            return Err(format!("too new: {:.1} hours", age_hours));
        }
        Ok(())
    }

    /// Recency weight by age bucket, multiplied by the peak-hour factor for
    /// the item's publication hour (UTC).
    pub fn decay_weight(&self, age_hours: f64, published_hour_utc: u32) -> f64 {
        let recency = age_bucket(age_hours).recency_weight();
        if recency == 0.0 {
            return 0.0;
        }
        let hour_factor = if self.peak_hours.contains(&published_hour_utc) {
            self.peak_multiplier
        } else {
            self.normal_multiplier
        };
        recency * hour_factor
    }
}

/// Per-sort-method engagement floor adjustment: `new` relaxes the source
/// minimum (fresh items have not accumulated score yet), `top` raises it
/// (weekly winners should clear a high bar).
pub fn adjusted_min_score(sort: SortMethod, base_min_score: i64) -> i64 {
    match sort {
        SortMethod::New => (base_min_score / 5).max(10),
        SortMethod::Top => base_min_score.max(200),
        SortMethod::Hot | SortMethod::Rising => base_min_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_boundaries_are_half_open() {
        assert_eq!(age_bucket(5.0), AgeBucket::Hours0To6);
        assert_eq!(age_bucket(6.0), AgeBucket::Hours6To24);
        assert_eq!(age_bucket(23.0), AgeBucket::Hours6To24);
        assert_eq!(age_bucket(24.0), AgeBucket::Days1To3);
        assert_eq!(age_bucket(50.0), AgeBucket::Days1To3);
        assert_eq!(age_bucket(72.0), AgeBucket::Days3To7);
        assert_eq!(age_bucket(40.0 * 24.0), AgeBucket::TooOld);
    }

    #[test]
    fn too_old_bucket_decays_to_zero() {
        let policy = TimePolicy::default();
        assert_eq!(policy.decay_weight(40.0 * 24.0, 10), 0.0);
        assert!(policy
            .is_within_window(40.0 * 24.0, SortMethod::Hot)
            .is_err());
    }

    #[test]
    fn hot_window_is_three_days() {
        let policy = TimePolicy::default();
        assert!(policy.is_within_window(50.0, SortMethod::Hot).is_ok());
        let err = policy
            .is_within_window(4.0 * 24.0, SortMethod::Hot)
            .unwrap_err();
        assert!(err.contains("too old"), "{err}");
    }

    #[test]
    fn new_and_rising_have_min_age_one_hour() {
        let policy = TimePolicy::default();
        assert!(policy.is_within_window(0.5, SortMethod::New).is_err());
        assert!(policy.is_within_window(2.0, SortMethod::New).is_ok());
        assert!(policy.is_within_window(0.5, SortMethod::Rising).is_err());
        assert!(policy.is_within_window(13.0, SortMethod::Rising).is_err());
    }

    #[test]
    fn global_min_age_applies_to_hot_and_top() {
        let policy = TimePolicy::default();
        let err = policy.is_within_window(1.0, SortMethod::Hot).unwrap_err();
        assert!(err.contains("too new"), "{err}");
        assert!(policy.is_within_window(1.0, SortMethod::Top).is_err());
    }

    #[test]
    fn decay_weight_combines_bucket_and_peak_hour() {
        let policy = TimePolicy::default();
        // 2h old, published at a peak hour.
        assert!((policy.decay_weight(2.0, 10) - 1.2 * 1.3).abs() < 1e-9);
        // 2h old, published off-peak.
        assert!((policy.decay_weight(2.0, 3) - 1.2).abs() < 1e-9);
        // 5 days old, off-peak.
        assert!((policy.decay_weight(5.0 * 24.0, 3) - 0.9).abs() < 1e-9);
    }

    #[test]
    fn sort_method_score_floors() {
        assert_eq!(adjusted_min_score(SortMethod::New, 30), 10);
        assert_eq!(adjusted_min_score(SortMethod::New, 100), 20);
        assert_eq!(adjusted_min_score(SortMethod::Top, 30), 200);
        assert_eq!(adjusted_min_score(SortMethod::Top, 500), 500);
        assert_eq!(adjusted_min_score(SortMethod::Hot, 30), 30);
    }

    #[test]
    fn sort_method_parses_case_insensitively() {
        assert_eq!("HOT".parse::<SortMethod>().unwrap(), SortMethod::Hot);
        assert!("best".parse::<SortMethod>().is_err());
    }
}
