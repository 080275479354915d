// src/score.rs
//! Composite quality scoring: engagement, content richness, topical
//! relevance, and freshness, each capped, summed and clamped to [0, 100].
//! The independent time-weighted variant multiplies by the decay weight and
//! is only used for cross-run comparison, never for eligibility.

use crate::types::Item;

/// Deterministic function of an item and the current time. Recomputed each
/// run, never mutated in place.
pub fn quality_score(item: &Item, related: bool, matched_keywords: usize, now_utc: i64) -> f64 {
    let mut score = 0.0;

    // Engagement (max 40)
    score += (item.score as f64 / 10.0).min(20.0);
    score += (item.num_comments as f64 / 5.0).min(10.0);
    score += item.upvote_ratio * 10.0;

    // Content richness (max 30)
    score += (item.title.chars().count() as f64 / 10.0).min(10.0);
    score += (item.body.chars().count() as f64 / 100.0).min(15.0);
    if item.url.is_some() {
        score += 5.0;
    }

    // Topical relevance (max 20)
    if related {
        score += 15.0 + (matched_keywords as f64).min(5.0);
    }

    // Freshness (max 10)
    let age_hours = (now_utc - item.created_utc) as f64 / 3600.0;
    if age_hours < 24.0 {
        score += 10.0;
    } else if age_hours < 72.0 {
        score += 5.0;
    }

    score.clamp(0.0, 100.0)
}

pub fn time_weighted_score(quality: f64, decay_weight: f64) -> f64 {
    quality * decay_weight
}

/// Persisted 0-10 relevance metadata derived from the time-weighted score.
pub fn tech_relevance_score(time_weighted: f64) -> f64 {
    (time_weighted / 10.0).min(10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemFlags;

    fn item(score: i64, comments: i64, ratio: f64, age_secs: i64, now: i64) -> Item {
        Item {
            id: "t3_test".into(),
            title: "New GPT-4 model".into(),
            body: "The model has 175B parameters".into(),
            score,
            num_comments: comments,
            upvote_ratio: ratio,
            created_utc: now - age_secs,
            author: "tester".into(),
            permalink: "https://reddit.com/r/test/1".into(),
            url: Some("https://arxiv.org/abs/2303.08774".into()),
            flags: ItemFlags::default(),
        }
    }

    #[test]
    fn score_is_always_within_bounds() {
        let now = 1_700_000_000;
        let extremes = [
            item(0, 0, 0.0, 90 * 24 * 3600, now),
            item(1_000_000, 100_000, 1.0, 60, now),
            item(-50, 0, 0.0, 3600, now),
        ];
        for it in &extremes {
            let s = quality_score(it, true, 100, now);
            assert!((0.0..=100.0).contains(&s), "score {s} out of bounds");
        }
    }

    #[test]
    fn component_breakdown_matches_expected() {
        let now = 1_700_000_000;
        // 2h old, score 120, 40 comments, 0.95 ratio, external link.
        let it = item(120, 40, 0.95, 2 * 3600, now);
        let s = quality_score(&it, true, 6, now);
        // engagement: 12 + 8 + 9.5; richness: 1.5 + 0.29 + 5;
        // relevance: 15 + 5 (keyword cap); freshness: 10.
        let expected = 12.0 + 8.0 + 9.5 + 1.5 + 0.29 + 5.0 + 20.0 + 10.0;
        assert!((s - expected).abs() < 1e-9, "got {s}, expected {expected}");
    }

    #[test]
    fn unrelated_items_get_no_relevance_component() {
        let now = 1_700_000_000;
        let it = item(120, 40, 0.95, 2 * 3600, now);
        let related = quality_score(&it, true, 0, now);
        let unrelated = quality_score(&it, false, 0, now);
        assert!((related - unrelated - 15.0).abs() < 1e-9);
    }

    #[test]
    fn freshness_tiers() {
        let now = 1_700_000_000;
        let fresh = quality_score(&item(0, 0, 0.0, 3600, now), false, 0, now);
        let day_old = quality_score(&item(0, 0, 0.0, 48 * 3600, now), false, 0, now);
        let stale = quality_score(&item(0, 0, 0.0, 80 * 3600, now), false, 0, now);
        assert!((fresh - day_old - 5.0).abs() < 1e-9);
        assert!((day_old - stale - 5.0).abs() < 1e-9);
    }

    #[test]
    fn time_weighting_multiplies_quality() {
        assert!((time_weighted_score(80.0, 1.2 * 1.3) - 124.8).abs() < 1e-9);
        assert_eq!(time_weighted_score(80.0, 0.0), 0.0);
        assert!((tech_relevance_score(124.8) - 10.0).abs() < 1e-9);
        assert!((tech_relevance_score(45.0) - 4.5).abs() < 1e-9);
    }
}
