// src/classify/lexicon.rs
//! Keyword tables for the rule-based classifier.
//!
//! Every table is an *ordered* slice of `(label, keywords)` pairs. Order is
//! a semantic contract: the relevance pass picks the first listed category
//! with any match as the primary category, and the content classifier breaks
//! score ties in favor of the earlier entry. Do not reorder casually and do
//! not replace these with maps.

/// AI keyword dictionary used for relevance tagging, ordered from core
/// technology down to merely adjacent vocabulary.
pub const AI_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "core-tech",
        &[
            "machine learning",
            "deep learning",
            "neural network",
            "artificial intelligence",
            "transformer",
            "attention",
            "llm",
            "large language model",
            "gpt",
            "bert",
            "diffusion",
            "stable diffusion",
            "computer vision",
            "nlp",
            "natural language processing",
            "reinforcement learning",
            "supervised learning",
            "unsupervised learning",
            "ai",
            "ml",
            "dl",
        ],
    ),
    (
        "architecture",
        &[
            "cnn", "rnn", "lstm", "gru", "gan", "vae", "autoencoder", "resnet", "vit",
            "vision transformer",
            "multimodal",
            "cross-modal",
            "foundation model",
            "neural",
            "network",
        ],
    ),
    (
        "applications",
        &[
            "autonomous driving",
            "robotics",
            "healthcare ai",
            "medical ai",
            "fintech",
            "generative ai",
            "conversational ai",
            "chatbot",
            "voice assistant",
            "tts",
            "speech recognition",
            "image generation",
            "text generation",
            "code generation",
            "automation",
            "intelligent",
            "smart",
            "predict",
            "classification",
            "recognition",
        ],
    ),
    (
        "tools",
        &[
            "pytorch",
            "tensorflow",
            "jax",
            "hugging face",
            "transformers",
            "langchain",
            "llamaindex",
            "openai",
            "anthropic",
            "claude",
            "gemini",
            "mistral",
            "scikit-learn",
            "keras",
            "fastai",
            "wandb",
            "mlflow",
            "jupyter",
            "python",
            "model",
        ],
    ),
    (
        "frontier",
        &[
            "agi",
            "artificial general intelligence",
            "few-shot",
            "zero-shot",
            "in-context learning",
            "prompt engineering",
            "fine-tuning",
            "lora",
            "qlora",
            "rag",
            "retrieval augmented",
            "multiagent",
            "agent",
            "reasoning",
            "chain of thought",
            "emergent abilities",
            "algorithm",
            "data science",
            "analytics",
            "optimization",
        ],
    ),
    (
        "adjacent",
        &[
            "tech",
            "technology",
            "innovation",
            "algorithm",
            "data",
            "dataset",
            "training",
            "inference",
            "prediction",
            "analysis",
            "computing",
            "gpu",
            "cloud",
            "api",
        ],
    ),
];

/// Smaller fallback list; a hit here yields the "general" category when no
/// dictionary keyword matched.
pub const GENERIC_AI_TERMS: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "algorithm",
    "model training",
    "inference",
    "automation",
    "prediction",
    "classification",
    "regression",
];

/// Content-type dictionary (paper/tool/application/news).
pub const CONTENT_TYPES: &[(&str, &[&str])] = &[
    (
        "paper",
        &["paper", "arxiv", "research", "study", "analysis", "survey", "review"],
    ),
    (
        "tool",
        &["tool", "library", "framework", "api", "model", "github", "code", "implementation"],
    ),
    (
        "application",
        &["use case", "application", "demo", "project", "example", "tutorial"],
    ),
    (
        "news",
        &["news", "announcement", "release", "update", "company", "industry"],
    ),
];

/// AI technical-area dictionary.
pub const AI_AREAS: &[(&str, &[&str])] = &[
    (
        "LLM",
        &["llm", "large language model", "gpt", "bert", "transformer", "language model"],
    ),
    (
        "computer-vision",
        &["computer vision", "cv", "image", "visual", "object detection", "segmentation"],
    ),
    (
        "nlp",
        &["nlp", "natural language", "text", "sentiment", "translation"],
    ),
    (
        "machine-learning",
        &["machine learning", "ml", "supervised", "unsupervised", "classification"],
    ),
    (
        "deep-learning",
        &["deep learning", "neural network", "cnn", "rnn", "lstm"],
    ),
    (
        "reinforcement-learning",
        &["reinforcement learning", "rl", "policy", "reward", "agent"],
    ),
    (
        "generative",
        &["generative", "generation", "diffusion", "gan", "stable diffusion"],
    ),
    (
        "agi",
        &["agi", "artificial general intelligence", "reasoning", "consciousness"],
    ),
];

pub const FALLBACK_CONTENT_TYPE: &str = "other";
pub const FALLBACK_AI_AREA: &str = "general";

// Auxiliary extraction tables: first match wins, defaults below.

pub const TECH_FRAMEWORKS: &[&str] = &[
    "pytorch",
    "tensorflow",
    "jax",
    "keras",
    "scikit-learn",
    "hugging face",
];

pub const TECH_LANGUAGES: &[&str] = &["python", "javascript", "rust", "julia", "c++", "java"];

pub const TECH_PLATFORMS: &[&str] = &["aws", "azure", "gcp", "google cloud", "nvidia", "cuda"];

pub const APPLICATION_DOMAINS: &[(&str, &[&str])] = &[
    ("healthcare", &["medical", "healthcare", "diagnosis", "drug", "patient"]),
    (
        "autonomous-driving",
        &["autonomous", "driving", "vehicle", "car", "transportation"],
    ),
    ("fintech", &["finance", "fintech", "trading", "banking", "risk"]),
    ("education", &["education", "learning", "student", "teaching", "course"]),
    ("entertainment", &["gaming", "entertainment", "music", "art", "creative"]),
    ("enterprise", &["business", "enterprise", "productivity", "workflow"]),
    ("research", &["research", "academic", "scientific", "experiment"]),
];

pub const DEFAULT_APPLICATION_DOMAIN: &str = "general";

pub const COMPLEXITY_LEVELS: &[(&str, &[&str])] = &[
    (
        "high",
        &["sota", "state-of-the-art", "novel", "breakthrough", "advanced", "complex"],
    ),
    (
        "medium",
        &["improved", "enhanced", "optimized", "efficient", "practical"],
    ),
    (
        "low",
        &["simple", "basic", "easy", "tutorial", "beginner", "introduction"],
    ),
];

pub const DEFAULT_COMPLEXITY: &str = "medium";

/// Minimal English stopword list for the frequency-based keyword fallback.
pub const STOPWORDS: &[&str] = &[
    "the", "and", "for", "that", "this", "with", "from", "have", "has", "had", "are", "was",
    "were", "been", "will", "would", "could", "should", "what", "when", "where", "which", "while",
    "about", "after", "before", "between", "into", "through", "during", "above", "below", "over",
    "under", "again", "then", "than", "them", "they", "their", "there", "here", "these", "those",
    "some", "such", "only", "very", "just", "more", "most", "other", "your", "you", "our", "its",
    "it's", "not", "but", "can", "does", "doing", "don't", "being", "because", "how", "why",
    "all", "any", "both", "each", "few", "also", "like", "out", "who", "whom",
];

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.iter().any(|w| *w == word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_order_puts_core_tech_first() {
        assert_eq!(AI_KEYWORDS[0].0, "core-tech");
        assert_eq!(AI_AREAS[0].0, "LLM");
        assert_eq!(CONTENT_TYPES[0].0, "paper");
    }

    #[test]
    fn no_empty_keyword_lists() {
        for (label, kws) in AI_KEYWORDS.iter().chain(CONTENT_TYPES).chain(AI_AREAS) {
            assert!(!kws.is_empty(), "empty keyword list for {label}");
        }
    }
}
