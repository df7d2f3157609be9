//! Lexicon-and-rules sentiment scoring.
//!
//! The scorer makes a single left-to-right pass over the tokenized text,
//! combining four rules:
//!
//! 1. **Intensity**: a modifier like "very" adds its multiplier when the
//!    *next* token is a sentiment word.
//! 2. **Negation**: words like "not" toggle a negation flag that inverts
//!    later polarity hits. Two negations cancel.
//! 3. **Polarity**: words from the positive/negative lexicons add +1/-1
//!    (inverted while negation is active).
//! 4. **Clause reset**: conjunctions like "but" end the negation's scope.
//!
//! The final score maps to a label: above 1 is positive, below -1 is
//! negative, everything in between (inclusive) is neutral.
//!
//! Scoring is a pure function of the input text and the [`Lexicon`] tables;
//! a [`SentimentScorer`] holds no mutable state and is safe to share across
//! tasks.

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::models::Sentiment;

/// Number of characters of input the scorer looks at by default.
pub const DEFAULT_MAX_CHARS: usize = 512;

const POSITIVE_WORDS: &[&str] = &[
    "good", "great", "excellent", "awesome", "wonderful", "fantastic",
    "amazing", "perfect", "brilliant", "outstanding", "superb", "nice",
    "love", "happy", "joy", "delightful", "pleasant", "beautiful",
    "best", "success", "win", "positive", "hope", "bright",
    "terrific", "incredible", "delighted", "glad", "fortunate",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad", "terrible", "awful", "horrible", "worst", "poor", "disappointing",
    "dreadful", "unpleasant", "negative", "fail", "problem", "issue", "sad",
    "unhappy", "trouble", "difficult", "worse", "hate", "angry",
    "frustrating", "disaster", "catastrophe", "loss", "pain", "challenge",
    "struggle", "miserable", "unfortunate",
];

const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 2.0),
    ("extremely", 2.5),
    ("incredibly", 2.5),
    ("absolutely", 2.0),
    ("totally", 2.0),
    ("completely", 2.0),
    ("highly", 1.5),
    ("quite", 1.5),
    ("really", 1.5),
    ("somewhat", 0.5),
    ("slightly", 0.5),
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "neither", "hardly", "scarcely",
    "nothing", "nobody", "none", "without",
];

// The punctuation entries can never match: punctuation is removed before
// tokenization, so only the conjunctions take effect.
const CLAUSE_BOUNDARIES: &[&str] = &[".", ",", ";", "and", "but", "or"];

/// Error raised when a lexicon violates its invariants at construction time.
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("word {0:?} appears in both the positive and negative lists")]
    OverlappingPolarity(String),

    #[error("intensity multiplier for {word:?} must be a positive number, got {value}")]
    NonPositiveMultiplier { word: String, value: f64 },
}

/// Raw lexicon tables as they appear in a YAML override file.
///
/// ```yaml
/// positive: [good, great]
/// negative: [bad]
/// intensifiers:
///   very: 2.0
/// negations: [not]
/// clause_boundaries: [and, but, or]
/// ```
///
/// Omitted fields are empty, not defaulted; a file that lists no negations
/// gets a scorer with negation disabled.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LexiconConfig {
    #[serde(default)]
    pub positive: Vec<String>,
    #[serde(default)]
    pub negative: Vec<String>,
    #[serde(default)]
    pub intensifiers: HashMap<String, f64>,
    #[serde(default)]
    pub negations: Vec<String>,
    #[serde(default)]
    pub clause_boundaries: Vec<String>,
}

/// Immutable word tables driving the scorer.
///
/// Built once at startup, either from the built-in vocabulary
/// ([`Lexicon::default`]) or from a validated [`LexiconConfig`], and owned
/// by the [`SentimentScorer`].
#[derive(Debug, Clone)]
pub struct Lexicon {
    positive: HashSet<String>,
    negative: HashSet<String>,
    intensifiers: HashMap<String, f64>,
    negations: HashSet<String>,
    clause_boundaries: HashSet<String>,
}

impl Lexicon {
    /// Build a lexicon from config tables.
    ///
    /// Entries are case-folded. Construction fails if a word carries both
    /// polarities or an intensity multiplier is zero, negative, or NaN.
    pub fn new(config: LexiconConfig) -> Result<Self, LexiconError> {
        let positive: HashSet<String> =
            config.positive.iter().map(|w| w.to_lowercase()).collect();
        let negative: HashSet<String> =
            config.negative.iter().map(|w| w.to_lowercase()).collect();

        if let Some(word) = positive.intersection(&negative).next() {
            return Err(LexiconError::OverlappingPolarity(word.clone()));
        }

        let mut intensifiers = HashMap::new();
        for (word, value) in config.intensifiers {
            if !(value > 0.0) {
                return Err(LexiconError::NonPositiveMultiplier { word, value });
            }
            intensifiers.insert(word.to_lowercase(), value);
        }

        Ok(Self {
            positive,
            negative,
            intensifiers,
            negations: config.negations.iter().map(|w| w.to_lowercase()).collect(),
            clause_boundaries: config
                .clause_boundaries
                .iter()
                .map(|w| w.to_lowercase())
                .collect(),
        })
    }
}

impl Default for Lexicon {
    /// The built-in English vocabulary.
    fn default() -> Self {
        Self {
            positive: POSITIVE_WORDS.iter().map(|w| w.to_string()).collect(),
            negative: NEGATIVE_WORDS.iter().map(|w| w.to_string()).collect(),
            intensifiers: INTENSIFIERS
                .iter()
                .map(|(w, m)| (w.to_string(), *m))
                .collect(),
            negations: NEGATION_WORDS.iter().map(|w| w.to_string()).collect(),
            clause_boundaries: CLAUSE_BOUNDARIES.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Rule-based sentiment classifier over a fixed [`Lexicon`].
#[derive(Debug, Clone)]
pub struct SentimentScorer {
    lexicon: Lexicon,
}

impl SentimentScorer {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Score `text` looking at the first [`DEFAULT_MAX_CHARS`] characters.
    pub fn analyze(&self, text: &str) -> Sentiment {
        self.analyze_within(text, DEFAULT_MAX_CHARS)
    }

    /// Score the first `max_chars` characters of `text`.
    ///
    /// The cut is character-count truncation and may fall mid-word; the
    /// severed fragment is scored as its own token. Scoring never fails:
    /// text with no lexicon hits is neutral.
    pub fn analyze_within(&self, text: &str, max_chars: usize) -> Sentiment {
        let tokens = tokenize(text, max_chars);

        let mut score = 0.0_f64;
        let mut negation_active = false;

        // The four rules are independent checks, not exclusive branches:
        // a token may match more than one table in the same iteration.
        for (i, word) in tokens.iter().enumerate() {
            if let Some(multiplier) = self.lexicon.intensifiers.get(word) {
                // Lookahead bonus by the next token's polarity. Applied
                // regardless of an active negation; only the plain polarity
                // hits below are inverted.
                if let Some(next) = tokens.get(i + 1) {
                    if self.lexicon.positive.contains(next) {
                        score += multiplier;
                    } else if self.lexicon.negative.contains(next) {
                        score -= multiplier;
                    }
                }
            }

            if self.lexicon.negations.contains(word) {
                negation_active = !negation_active;
            }

            if self.lexicon.positive.contains(word) {
                score += if negation_active { -1.0 } else { 1.0 };
            }

            if self.lexicon.negative.contains(word) {
                score -= if negation_active { -1.0 } else { 1.0 };
            }

            if self.lexicon.clause_boundaries.contains(word) {
                negation_active = false;
            }
        }

        // Strict thresholds: a score of exactly 1 or -1 stays neutral.
        if score > 1.0 {
            Sentiment::Positive
        } else if score < -1.0 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Truncate to `max_chars` characters, lowercase, strip ASCII punctuation,
/// and split on whitespace.
///
/// Punctuation is removed rather than replaced, so words separated only by
/// punctuation collapse into a single token.
fn tokenize(text: &str, max_chars: usize) -> Vec<String> {
    let window: String = text.chars().take(max_chars).collect();
    let cleaned: String = window
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_ascii_punctuation())
        .collect();
    cleaned
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
