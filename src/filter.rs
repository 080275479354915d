// src/filter.rs
//! Eligibility gate an item must pass before classification and scoring.
//! Checks run in a fixed order and the first failure short-circuits; the
//! rejection reason is diagnostic only and never retried.

use crate::classify::{self, RelevanceResult};
use crate::config::SourceConfig;
use crate::time_policy::{adjusted_min_score, SortMethod, TimePolicy};
use crate::types::Item;
use std::fmt;

const MIN_UPVOTE_RATIO: f64 = 0.6;
const DELETION_MARKER: &str = "[deleted]";

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    ScoreBelowThreshold { score: i64, min: i64 },
    TooFewComments { comments: i64, min: i64 },
    LowUpvoteRatio(f64),
    Nsfw,
    Removed,
    DeletionMarker,
    OutsideWindow(String),
    NotRelevant,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::ScoreBelowThreshold { score, min } => {
                write!(f, "score {score} below threshold {min}")
            }
            Rejection::TooFewComments { comments, min } => {
                write!(f, "{comments} comments below threshold {min}")
            }
            Rejection::LowUpvoteRatio(r) => write!(f, "upvote ratio {r:.2} below 0.60"),
            Rejection::Nsfw => f.write_str("flagged nsfw"),
            Rejection::Removed => f.write_str("removed by moderators"),
            Rejection::DeletionMarker => f.write_str("title carries deletion marker"),
            Rejection::OutsideWindow(reason) => f.write_str(reason),
            Rejection::NotRelevant => f.write_str("no topical keyword match"),
        }
    }
}

/// Run the gate for one item fetched via `sort`. On success the topical
/// relevance result is returned so the caller does not re-match keywords
/// when scoring.
pub fn check_eligibility(
    item: &Item,
    source: &SourceConfig,
    sort: SortMethod,
    policy: &TimePolicy,
    now_utc: i64,
) -> Result<RelevanceResult, Rejection> {
    let min_score = adjusted_min_score(sort, source.min_score);
    if item.score < min_score {
        return Err(Rejection::ScoreBelowThreshold {
            score: item.score,
            min: min_score,
        });
    }
    if item.num_comments < source.min_comments {
        return Err(Rejection::TooFewComments {
            comments: item.num_comments,
            min: source.min_comments,
        });
    }
    if item.upvote_ratio < MIN_UPVOTE_RATIO {
        return Err(Rejection::LowUpvoteRatio(item.upvote_ratio));
    }
    if item.flags.nsfw {
        return Err(Rejection::Nsfw);
    }
    if item.flags.removed {
        return Err(Rejection::Removed);
    }
    if item.title.contains(DELETION_MARKER) {
        return Err(Rejection::DeletionMarker);
    }

    let age_hours = (now_utc - item.created_utc) as f64 / 3600.0;
    policy
        .is_within_window(age_hours, sort)
        .map_err(Rejection::OutsideWindow)?;

    let relevance = classify::is_related(&item.title, &item.body);
    if !relevance.related {
        return Err(Rejection::NotRelevant);
    }

    Ok(relevance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemFlags;

    const NOW: i64 = 1_700_000_000;

    fn source() -> SourceConfig {
        SourceConfig {
            name: "MachineLearning".into(),
            weight: 0.7,
            min_score: 30,
            min_comments: 5,
            target_posts: 12,
            sort_methods: vec![SortMethod::Hot],
        }
    }

    fn good_item() -> Item {
        Item {
            id: "t3_abc".into(),
            title: "New GPT-4 model".into(),
            body: "It has 175B parameters".into(),
            score: 120,
            num_comments: 40,
            upvote_ratio: 0.95,
            created_utc: NOW - 5 * 3600,
            author: "researcher".into(),
            permalink: "https://reddit.com/r/MachineLearning/abc".into(),
            url: None,
            flags: ItemFlags::default(),
        }
    }

    fn check(item: &Item) -> Result<RelevanceResult, Rejection> {
        check_eligibility(item, &source(), SortMethod::Hot, &TimePolicy::default(), NOW)
    }

    #[test]
    fn passing_item_returns_relevance() {
        let rel = check(&good_item()).unwrap();
        assert!(rel.related);
        assert_eq!(rel.primary_category, Some("core-tech"));
    }

    #[test]
    fn low_score_short_circuits_everything_else() {
        // Every other field is also bad; only the score reason is reported.
        let mut it = good_item();
        it.score = 5;
        it.num_comments = 0;
        it.upvote_ratio = 0.1;
        it.flags.nsfw = true;
        it.created_utc = NOW - 90 * 24 * 3600;
        assert_eq!(
            check(&it),
            Err(Rejection::ScoreBelowThreshold { score: 5, min: 30 })
        );
    }

    #[test]
    fn checks_run_in_documented_order() {
        let mut it = good_item();
        it.num_comments = 1;
        assert!(matches!(check(&it), Err(Rejection::TooFewComments { .. })));

        let mut it = good_item();
        it.upvote_ratio = 0.5;
        assert!(matches!(check(&it), Err(Rejection::LowUpvoteRatio(_))));

        let mut it = good_item();
        it.flags.nsfw = true;
        assert_eq!(check(&it), Err(Rejection::Nsfw));

        let mut it = good_item();
        it.flags.removed = true;
        assert_eq!(check(&it), Err(Rejection::Removed));

        let mut it = good_item();
        it.title = "[deleted] machine learning post".into();
        assert_eq!(check(&it), Err(Rejection::DeletionMarker));
    }

    #[test]
    fn stale_item_is_outside_window() {
        let mut it = good_item();
        it.created_utc = NOW - 5 * 24 * 3600; // beyond hot's 3-day lookback
        assert!(matches!(check(&it), Err(Rejection::OutsideWindow(_))));
    }

    #[test]
    fn off_topic_item_is_rejected_last() {
        let mut it = good_item();
        it.title = "Best sourdough recipe".into();
        it.body = "Flour, water, salt.".into();
        assert_eq!(check(&it), Err(Rejection::NotRelevant));
    }

    #[test]
    fn top_sort_raises_the_score_floor() {
        let mut it = good_item();
        it.score = 150; // clears the source floor of 30, not top's 200
        let res = check_eligibility(
            &it,
            &source(),
            SortMethod::Top,
            &TimePolicy::default(),
            NOW,
        );
        assert_eq!(
            res,
            Err(Rejection::ScoreBelowThreshold {
                score: 150,
                min: 200
            })
        );
    }
}
