// src/classify/mod.rs
//! Rule-based relevance gate and content classification.
//!
//! Deterministic by construction: every dictionary is an ordered slice
//! (see `lexicon`), matching is lowercase substring containment, and score
//! ties resolve to the earlier entry. No learned components.

pub mod extract;
pub mod lexicon;

use crate::types::{Classification, TechStack};
use lexicon::{
    AI_AREAS, AI_KEYWORDS, APPLICATION_DOMAINS, COMPLEXITY_LEVELS, CONTENT_TYPES,
    DEFAULT_APPLICATION_DOMAIN, DEFAULT_COMPLEXITY, FALLBACK_AI_AREA, FALLBACK_CONTENT_TYPE,
    GENERIC_AI_TERMS, TECH_FRAMEWORKS, TECH_LANGUAGES, TECH_PLATFORMS,
};

/// Outcome of the topical-relevance pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceResult {
    pub related: bool,
    /// First dictionary category with any match; `"general"` if only the
    /// generic fallback list hit.
    pub primary_category: Option<&'static str>,
    /// Union of matched keywords across all categories.
    pub matched_keywords: Vec<String>,
}

impl RelevanceResult {
    fn unrelated() -> Self {
        Self {
            related: false,
            primary_category: None,
            matched_keywords: Vec::new(),
        }
    }
}

/// Topical relevance over `title + body`, lowercased. The primary category
/// is the *first* table entry with any match (table order is the tie-break
/// contract), while matched keywords are collected from every category.
pub fn is_related(title: &str, body: &str) -> RelevanceResult {
    let text = format!("{} {}", title, body).to_lowercase();

    let mut primary: Option<&'static str> = None;
    let mut matched: Vec<String> = Vec::new();

    for (category, keywords) in AI_KEYWORDS {
        let mut any = false;
        for kw in *keywords {
            if text.contains(kw) {
                any = true;
                matched.push((*kw).to_string());
            }
        }
        if any && primary.is_none() {
            primary = Some(category);
        }
    }

    if !matched.is_empty() {
        return RelevanceResult {
            related: true,
            primary_category: primary,
            matched_keywords: matched,
        };
    }

    // Fallback: generic AI vocabulary still counts, but only as "general".
    for term in GENERIC_AI_TERMS {
        if text.contains(term) {
            return RelevanceResult {
                related: true,
                primary_category: Some(FALLBACK_AI_AREA),
                matched_keywords: vec![(*term).to_string()],
            };
        }
    }

    RelevanceResult::unrelated()
}

/// Full content classification over both dictionaries plus the auxiliary
/// keyword-presence lookups.
pub fn classify(title: &str, body: &str) -> Classification {
    let text = format!("{} {}", title, body).to_lowercase();

    let content_scores = score_table(&text, CONTENT_TYPES);
    let area_scores = score_table(&text, AI_AREAS);

    let content_type = best_label(&content_scores).unwrap_or(FALLBACK_CONTENT_TYPE);
    let primary_category = best_label(&area_scores).unwrap_or(FALLBACK_AI_AREA);

    // Confidence per dictionary: matched-count over a normalizing constant,
    // 0.5 when the dictionary saw nothing; averaged across the two.
    let content_confidence = match max_score(&content_scores) {
        Some(max) => (max as f64 / 3.0).min(1.0),
        None => 0.5,
    };
    let area_confidence = match max_score(&area_scores) {
        Some(max) => (max as f64 / 2.0).min(1.0),
        None => 0.5,
    };

    Classification {
        primary_category: primary_category.to_string(),
        secondary_categories: area_scores
            .iter()
            .map(|(label, _)| (*label).to_string())
            .collect(),
        content_type: content_type.to_string(),
        confidence: (content_confidence + area_confidence) / 2.0,
        tech_stack: extract_tech_stack(&text),
        application_domain: first_matching_label(&text, APPLICATION_DOMAINS)
            .unwrap_or(DEFAULT_APPLICATION_DOMAIN)
            .to_string(),
        complexity_level: first_matching_label(&text, COMPLEXITY_LEVELS)
            .unwrap_or(DEFAULT_COMPLEXITY)
            .to_string(),
    }
}

/// Matched-keyword counts per category, in table order, zero-score entries
/// dropped.
fn score_table(text: &str, table: &[(&'static str, &[&str])]) -> Vec<(&'static str, u32)> {
    table
        .iter()
        .filter_map(|(label, keywords)| {
            let count = keywords.iter().filter(|kw| text.contains(**kw)).count() as u32;
            (count > 0).then_some((*label, count))
        })
        .collect()
}

/// Highest count wins; a strictly-greater score is required to displace an
/// earlier entry, so ties resolve to the first-encountered label.
fn best_label(scores: &[(&'static str, u32)]) -> Option<&'static str> {
    let mut best: Option<(&'static str, u32)> = None;
    for (label, count) in scores {
        match best {
            Some((_, best_count)) if *count <= best_count => {}
            _ => best = Some((label, *count)),
        }
    }
    best.map(|(label, _)| label)
}

fn max_score(scores: &[(&'static str, u32)]) -> Option<u32> {
    scores.iter().map(|(_, c)| *c).max()
}

fn first_matching_label(text: &str, table: &[(&'static str, &[&str])]) -> Option<&'static str> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(label, _)| *label)
}

fn extract_tech_stack(text: &str) -> TechStack {
    let hits = |list: &[&str]| -> Vec<String> {
        list.iter()
            .filter(|entry| text.contains(**entry))
            .map(|entry| entry.to_string())
            .collect()
    };
    TechStack {
        frameworks: hits(TECH_FRAMEWORKS),
        languages: hits(TECH_LANGUAGES),
        platforms: hits(TECH_PLATFORMS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpt_post_is_core_tech() {
        let rel = is_related("New GPT-4 model", "175B parameters, trained with PyTorch");
        assert!(rel.related);
        assert_eq!(rel.primary_category, Some("core-tech"));
        assert!(rel.matched_keywords.iter().any(|k| k == "gpt"));
    }

    #[test]
    fn generic_fallback_yields_general() {
        // "regression" only appears in the generic term list.
        let rel = is_related("Linear regression from scratch", "");
        assert!(rel.related);
        assert_eq!(rel.primary_category, Some("general"));
    }

    #[test]
    fn unrelated_text_is_rejected() {
        let rel = is_related("Best sourdough recipe", "Flour, water, salt. Rest overnight.");
        assert!(!rel.related);
        assert!(rel.matched_keywords.is_empty());
    }

    #[test]
    fn area_tie_breaks_by_dictionary_order() {
        // One keyword from "LLM" (gpt) and one from "computer-vision"
        // (segmentation): equal counts, so the earlier entry wins.
        let c = classify("gpt segmentation", "");
        assert_eq!(c.primary_category, "LLM");
        // And reproducibly so.
        let c2 = classify("gpt segmentation", "");
        assert_eq!(c.primary_category, c2.primary_category);
    }

    #[test]
    fn llm_paper_classification() {
        let c = classify(
            "New GPT-4 paper on arxiv",
            "A large language model study with novel transformer results",
        );
        assert_eq!(c.primary_category, "LLM");
        assert_eq!(c.content_type, "paper");
        assert_eq!(c.complexity_level, "high"); // "novel"
        assert!(c.confidence > 0.5 && c.confidence <= 1.0);
        assert!(c.secondary_categories.contains(&"LLM".to_string()));
    }

    #[test]
    fn defaults_when_nothing_matches() {
        let c = classify("hello", "world");
        assert_eq!(c.primary_category, "general");
        assert_eq!(c.content_type, "other");
        assert_eq!(c.application_domain, "general");
        assert_eq!(c.complexity_level, "medium");
        assert!((c.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn tech_stack_presence_lookup() {
        let c = classify("Training with PyTorch on NVIDIA CUDA", "python scripts");
        assert_eq!(c.tech_stack.frameworks, vec!["pytorch"]);
        assert_eq!(c.tech_stack.languages, vec!["python"]);
        assert!(c.tech_stack.platforms.contains(&"nvidia".to_string()));
    }
}
