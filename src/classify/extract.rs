// src/classify/extract.rs
//! Keyword/term extraction for persisted metadata. Three passes feed one
//! merged list: dictionary hits with frequency and position, regex-extracted
//! technical terms at a fixed high confidence, and a frequency-based
//! fallback over non-stopword tokens. Merged case-insensitively, keeping the
//! highest-confidence entry per keyword, sorted by confidence descending.

use crate::classify::lexicon::{is_stopword, AI_KEYWORDS};
use crate::types::{ExtractedKeyword, ExtractionMethod, KeywordPosition};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const REGEX_TERM_CONFIDENCE: f64 = 0.9;
const FALLBACK_MAX_KEYWORDS: usize = 10;
const FALLBACK_MIN_FREQUENCY: u32 = 2;

struct TermPattern {
    category: &'static str,
    re: Regex,
}

static TERM_PATTERNS: Lazy<Vec<TermPattern>> = Lazy::new(|| {
    let pat = |category: &'static str, pattern: &str| TermPattern {
        category,
        re: Regex::new(pattern).expect("term pattern"),
    };
    vec![
        pat(
            "models",
            r"(?i)\b(GPT-?\d+|Claude-?\d+|LLaMA-?\d+|Mistral-?\d+|BERT|T5|PaLM|Gemini|Llama|ChatGPT)\b",
        ),
        pat(
            "metrics",
            r"(?i)\b(\d+\.?\d*)\s*(BLEU|ROUGE|accuracy|F1|perplexity|MMLU|HumanEval)\b",
        ),
        pat(
            "parameters",
            r"(?i)\b(\d+\.?\d*)\s*([BMK]|billion|million|thousand)?\s*(parameters?|params?)\b",
        ),
        pat(
            "dataset_size",
            r"(?i)\b(\d+\.?\d*)\s*([BMK]|billion|million|thousand)?\s*(tokens?|examples?|samples?)\b",
        ),
        pat(
            "frameworks",
            r"(?i)\b(PyTorch|TensorFlow|JAX|Hugging\s*Face|transformers|scikit-learn|Keras|FastAI)\b",
        ),
        pat("github_links", r"(?i)https?://github\.com/[\w.-]+/[\w.-]+"),
        pat("arxiv_papers", r"(?i)arxiv:\s*(\d{4}\.\d{4,5})"),
        pat(
            "organizations",
            r"(?i)\b(OpenAI|Anthropic|Google|Microsoft|Meta|DeepMind|NVIDIA|Stability\s*AI)\b",
        ),
    ]
});

static RE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)https?://\S+").expect("url regex"));
static RE_NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("non-alnum regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// All three extraction passes, merged and deduplicated. The pipeline caps
/// the persisted list at 20 entries.
pub fn extract_all(title: &str, body: &str) -> Vec<ExtractedKeyword> {
    let full_text = format!("{} {}", title, body);

    let mut all = extract_dictionary_keywords(title, body);
    all.extend(extract_technical_terms(&full_text));
    all.extend(extract_frequency_keywords(&full_text));

    dedup_keep_best(all)
}

/// Dictionary pass: AI keywords present as substrings, with occurrence
/// frequency and title/body position. Confidence grows with frequency and
/// caps below the regex tier.
pub fn extract_dictionary_keywords(title: &str, body: &str) -> Vec<ExtractedKeyword> {
    let title_lower = title.to_lowercase();
    let body_lower = body.to_lowercase();
    let text = format!("{} {}", title_lower, body_lower);

    let mut out = Vec::new();
    for (category, keywords) in AI_KEYWORDS {
        for kw in *keywords {
            let frequency = text.matches(kw).count() as u32;
            if frequency == 0 {
                continue;
            }
            let position = if title_lower.contains(kw) {
                KeywordPosition::Title
            } else {
                KeywordPosition::Body
            };
            out.push(ExtractedKeyword {
                keyword: (*kw).to_string(),
                category: (*category).to_string(),
                confidence: (0.5 + frequency as f64 * 0.1).min(0.9),
                method: ExtractionMethod::Dictionary,
                frequency,
                position,
            });
        }
    }
    out
}

/// Regex pass: model names, metric mentions, parameter/dataset sizes,
/// frameworks, links, organizations. Fixed high confidence.
pub fn extract_technical_terms(text: &str) -> Vec<ExtractedKeyword> {
    let mut out = Vec::new();
    for pattern in TERM_PATTERNS.iter() {
        for caps in pattern.re.captures_iter(text) {
            let term = if caps.len() > 1 {
                let parts: Vec<&str> = caps
                    .iter()
                    .skip(1)
                    .flatten()
                    .map(|m| m.as_str())
                    .collect();
                parts.join(" ")
            } else {
                caps.get(0).map(|m| m.as_str()).unwrap_or_default().to_string()
            };
            let term = term.trim().to_string();
            if term.is_empty() {
                continue;
            }
            out.push(ExtractedKeyword {
                keyword: term,
                category: pattern.category.to_string(),
                confidence: REGEX_TERM_CONFIDENCE,
                method: ExtractionMethod::Regex,
                frequency: 1,
                position: KeywordPosition::Body,
            });
        }
    }
    out
}

/// Frequency fallback: non-stopword tokens longer than 3 chars appearing at
/// least twice, confidence `min(1, freq / 10)`.
pub fn extract_frequency_keywords(text: &str) -> Vec<ExtractedKeyword> {
    let clean = clean_text(text);
    if clean.split_whitespace().count() < 3 {
        return Vec::new();
    }

    let mut freq: HashMap<String, u32> = HashMap::new();
    for word in clean.split_whitespace() {
        let word = word.to_lowercase();
        if word.len() > 3 && !is_stopword(&word) {
            *freq.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, u32)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    ranked
        .into_iter()
        .take(FALLBACK_MAX_KEYWORDS)
        .filter(|(_, f)| *f >= FALLBACK_MIN_FREQUENCY)
        .map(|(word, frequency)| ExtractedKeyword {
            keyword: word,
            category: "general".to_string(),
            confidence: (frequency as f64 / 10.0).min(1.0),
            method: ExtractionMethod::Frequency,
            frequency,
            position: KeywordPosition::Body,
        })
        .collect()
}

/// Decode HTML entities, strip URLs and punctuation, collapse whitespace.
fn clean_text(text: &str) -> String {
    let decoded = html_escape::decode_html_entities(text).to_string();
    let no_urls = RE_URL.replace_all(&decoded, "");
    let alnum = RE_NON_ALNUM.replace_all(&no_urls, " ");
    RE_WS.replace_all(&alnum, " ").trim().to_string()
}

/// Case-insensitive dedup keeping the highest-confidence entry per keyword,
/// then sort by confidence descending (stable for equal confidence).
fn dedup_keep_best(keywords: Vec<ExtractedKeyword>) -> Vec<ExtractedKeyword> {
    let mut best: HashMap<String, ExtractedKeyword> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for kw in keywords {
        let key = kw.keyword.to_lowercase();
        match best.get(&key) {
            Some(existing) if existing.confidence >= kw.confidence => {}
            Some(_) => {
                best.insert(key, kw);
            }
            None => {
                best.insert(key.clone(), kw);
                order.push(key);
            }
        }
    }

    let mut out: Vec<ExtractedKeyword> = order
        .into_iter()
        .filter_map(|key| best.remove(&key))
        .collect();
    out.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_hits_carry_frequency_and_position() {
        let out = extract_dictionary_keywords(
            "GPT breakthrough",
            "The new gpt release uses a transformer backbone.",
        );
        let gpt = out.iter().find(|k| k.keyword == "gpt").unwrap();
        assert_eq!(gpt.frequency, 2);
        assert_eq!(gpt.position, KeywordPosition::Title);
        assert!((gpt.confidence - 0.7).abs() < 1e-9);

        let transformer = out.iter().find(|k| k.keyword == "transformer").unwrap();
        assert_eq!(transformer.position, KeywordPosition::Body);
    }

    #[test]
    fn regex_pass_finds_models_and_parameters() {
        let out = extract_technical_terms("GPT-4 has 175B parameters, see arxiv: 2303.08774");
        assert!(out.iter().any(|k| k.keyword == "GPT-4" && k.category == "models"));
        assert!(out
            .iter()
            .any(|k| k.category == "parameters" && k.keyword.contains("175")));
        assert!(out.iter().any(|k| k.category == "arxiv_papers"));
        assert!(out.iter().all(|k| (k.confidence - 0.9).abs() < 1e-9));
    }

    #[test]
    fn frequency_fallback_requires_two_occurrences() {
        let text = "quantization quantization quantization weights weights once";
        let out = extract_frequency_keywords(text);
        let quant = out.iter().find(|k| k.keyword == "quantization").unwrap();
        assert_eq!(quant.frequency, 3);
        assert!((quant.confidence - 0.3).abs() < 1e-9);
        assert!(out.iter().all(|k| k.keyword != "once"));
    }

    #[test]
    fn merge_dedups_case_insensitively_keeping_best() {
        let out = extract_all("PyTorch tips", "pytorch pytorch and more pytorch tricks");
        let hits: Vec<&ExtractedKeyword> = out
            .iter()
            .filter(|k| k.keyword.eq_ignore_ascii_case("pytorch"))
            .collect();
        assert_eq!(hits.len(), 1);
        // Regex tier (0.9) beats dictionary and frequency confidences here.
        assert!((hits[0].confidence - 0.9).abs() < 1e-9);
        // Sorted by confidence descending.
        for pair in out.windows(2) {
            assert!(pair[0].confidence >= pair[1].confidence);
        }
    }
}
