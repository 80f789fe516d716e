//! Tiered keyword scoring.
//!
//! Matching is case-insensitive substring counting: the text is lowercased
//! once, then every term is counted by a non-overlapping forward scan. A term
//! embedded in a longer word still counts ("ai" inside "said"), which is why
//! the weak tier carries an aggregate cap.

use serde::{Deserialize, Serialize};

pub const STRONG_AI_WEIGHT: f64 = 5.0;
pub const WEAK_AI_WEIGHT: f64 = 1.0;
pub const WEAK_AI_CAP: f64 = 30.0;
pub const CONTENT_WEIGHT: f64 = 12.0;
pub const USER_TERM_WEIGHT: f64 = 30.0;

pub const STRONG_AI_TERMS: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "neural network",
    "generative ai",
    "large language model",
    "llm",
    "gpt",
];

pub const WEAK_AI_TERMS: &[&str] = &[
    "ai",
    "automation",
    "algorithm",
    "chatbot",
    "computer vision",
    "data science",
];

pub const CONTENT_TERMS: &[&str] = &[
    "news",
    "report",
    "analysis",
    "announced",
    "launch",
    "study",
];

/// A named keyword set with a per-occurrence weight.
///
/// When `cap` is set it bounds the tier's summed weighted score, not any
/// single term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordTier {
    pub name: String,
    pub terms: Vec<String>,
    pub weight: f64,
    #[serde(default)]
    pub cap: Option<f64>,
}

impl KeywordTier {
    pub fn new(name: &str, terms: &[&str], weight: f64, cap: Option<f64>) -> Self {
        Self {
            name: name.to_string(),
            terms: terms.iter().map(|t| t.to_lowercase()).collect(),
            weight,
            cap,
        }
    }

    /// Returns (raw occurrence count, uncapped weighted sum) and appends hits.
    fn tally(&self, text: &str, hits: &mut Vec<KeywordHit>) -> (u32, f64) {
        let mut occurrences = 0;
        for term in &self.terms {
            let count = count_occurrences(text, &term.to_lowercase());
            if count > 0 {
                hits.push(KeywordHit {
                    term: term.clone(),
                    count,
                });
                occurrences += count;
            }
        }
        (occurrences, occurrences as f64 * self.weight)
    }

    fn capped(&self, raw: f64) -> f64 {
        match self.cap {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }
}

/// Tier definitions and the user-term weight for one scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub strong: KeywordTier,
    pub weak: KeywordTier,
    pub content: KeywordTier,
    pub user_weight: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            strong: KeywordTier::new("strong AI", STRONG_AI_TERMS, STRONG_AI_WEIGHT, None),
            weak: KeywordTier::new("weak AI", WEAK_AI_TERMS, WEAK_AI_WEIGHT, Some(WEAK_AI_CAP)),
            content: KeywordTier::new("content quality", CONTENT_TERMS, CONTENT_WEIGHT, None),
            user_weight: USER_TERM_WEIGHT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHit {
    pub term: String,
    pub count: u32,
}

/// Result of scoring one block of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub total: f64,
    /// Strong plus weak occurrences, uncapped. Display only.
    ///
    /// This is a plain occurrence count, so it does not move when tier
    /// weights are reconfigured. At the default weights it equals
    /// `strong / 5.0 + weak_raw`.
    pub ai_count: u32,
    /// Occurrences of every user-term alternative, uncapped.
    pub user_count: u32,
    pub strong: f64,
    pub weak_raw: f64,
    pub content: f64,
    pub user: f64,
    /// Matched terms in tier declaration order.
    pub hits: Vec<KeywordHit>,
}

#[derive(Debug, Clone, Default)]
pub struct KeywordScorer {
    config: ScoringConfig,
}

impl KeywordScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Score `text` against the tiers and the whitespace-separated
    /// alternatives of `user_term`.
    pub fn score(&self, text: &str, user_term: &str) -> ScoreBreakdown {
        if text.is_empty() {
            return ScoreBreakdown::default();
        }
        let text = text.to_lowercase();
        let mut hits = Vec::new();

        let (strong_hits, strong) = self.config.strong.tally(&text, &mut hits);
        let (weak_hits, weak_raw) = self.config.weak.tally(&text, &mut hits);
        let (_, content_raw) = self.config.content.tally(&text, &mut hits);

        let mut user_count = 0;
        for alternative in user_alternatives(user_term) {
            let count = count_occurrences(&text, &alternative);
            if count > 0 {
                hits.push(KeywordHit {
                    term: alternative,
                    count,
                });
                user_count += count;
            }
        }
        let user = user_count as f64 * self.config.user_weight;

        let strong = self.config.strong.capped(strong);
        let content = self.config.content.capped(content_raw);
        let total = strong + self.config.weak.capped(weak_raw) + content + user;

        ScoreBreakdown {
            total,
            ai_count: strong_hits + weak_hits,
            user_count,
            strong,
            weak_raw,
            content,
            user,
            hits,
        }
    }
}

/// Lowercased, de-duplicated alternatives of a user term, in input order.
pub fn user_alternatives(user_term: &str) -> Vec<String> {
    let mut alternatives: Vec<String> = Vec::new();
    for word in user_term.split_whitespace() {
        let word = word.to_lowercase();
        if !alternatives.contains(&word) {
            alternatives.push(word);
        }
    }
    alternatives
}

/// Non-overlapping forward-scan count. An empty needle never matches.
pub fn count_occurrences(haystack: &str, needle: &str) -> u32 {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count() as u32
}
