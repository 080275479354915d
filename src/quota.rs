// src/quota.rs
//! Quota allocation: per-source remaining needed counts derived from the
//! fixed daily target and an explicit snapshot of what today has already
//! collected. The snapshot is taken once at run start (no implicit shared
//! counters); the pipeline refreshes the global count only at per-source
//! checkpoints.

use crate::config::SourceConfig;
use std::collections::HashMap;

/// Counts read from the store at a defined checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CollectedSnapshot {
    pub total: u32,
    pub by_source: HashMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAllocation {
    pub source: String,
    pub needed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaPlan {
    /// Daily target minus today's total; zero means the run is a no-op
    /// success.
    pub remaining_global: u32,
    /// Sources with unmet quota, in configured priority order. The global
    /// cap always wins over per-source quota: the pipeline stops as soon as
    /// the global remainder reaches zero even if later entries still have
    /// needs.
    pub allocations: Vec<SourceAllocation>,
}

pub fn plan(
    daily_target: u32,
    sources: &[SourceConfig],
    snapshot: &CollectedSnapshot,
) -> QuotaPlan {
    let remaining_global = daily_target.saturating_sub(snapshot.total);

    let allocations = if remaining_global == 0 {
        Vec::new()
    } else {
        sources
            .iter()
            .filter_map(|src| {
                let already = snapshot.by_source.get(&src.name).copied().unwrap_or(0);
                let needed = src.target_posts.saturating_sub(already);
                (needed > 0).then(|| SourceAllocation {
                    source: src.name.clone(),
                    needed,
                })
            })
            .collect()
    };

    QuotaPlan {
        remaining_global,
        allocations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_policy::SortMethod;

    fn sources() -> Vec<SourceConfig> {
        ["ChatGPT", "LocalLLaMA", "NLP"]
            .iter()
            .zip([10u32, 6, 4])
            .map(|(name, target)| SourceConfig {
                name: name.to_string(),
                weight: 1.0,
                min_score: 10,
                min_comments: 1,
                target_posts: target,
                sort_methods: vec![SortMethod::Hot],
            })
            .collect()
    }

    fn snapshot(total: u32, pairs: &[(&str, u32)]) -> CollectedSnapshot {
        CollectedSnapshot {
            total,
            by_source: pairs.iter().map(|(n, c)| (n.to_string(), *c)).collect(),
        }
    }

    #[test]
    fn fresh_day_allocates_full_targets_in_order() {
        let p = plan(20, &sources(), &snapshot(0, &[]));
        assert_eq!(p.remaining_global, 20);
        assert_eq!(
            p.allocations,
            vec![
                SourceAllocation { source: "ChatGPT".into(), needed: 10 },
                SourceAllocation { source: "LocalLLaMA".into(), needed: 6 },
                SourceAllocation { source: "NLP".into(), needed: 4 },
            ]
        );
    }

    #[test]
    fn satisfied_sources_are_skipped() {
        let p = plan(20, &sources(), &snapshot(12, &[("ChatGPT", 10), ("LocalLLaMA", 2)]));
        assert_eq!(p.remaining_global, 8);
        assert_eq!(
            p.allocations,
            vec![
                SourceAllocation { source: "LocalLLaMA".into(), needed: 4 },
                SourceAllocation { source: "NLP".into(), needed: 4 },
            ]
        );
    }

    #[test]
    fn met_target_is_a_noop() {
        let p = plan(20, &sources(), &snapshot(20, &[("ChatGPT", 10)]));
        assert_eq!(p.remaining_global, 0);
        assert!(p.allocations.is_empty());
    }

    #[test]
    fn over_collection_saturates_instead_of_underflowing() {
        let p = plan(20, &sources(), &snapshot(25, &[("ChatGPT", 15)]));
        assert_eq!(p.remaining_global, 0);
        assert!(p.allocations.is_empty());
    }
}
