//! Keyword event classification and lexicon-based sentiment scoring.
//!
//! Both functions are pure and deterministic: no learned state, no
//! randomness. The same text always classifies and scores the same way.

use std::collections::HashSet;

/// Ordered category -> keyword table. Substring match over lowercased
/// text; first match in table order wins, so order is the tie-break.
/// Price events are not classified here (they come from price ingestion).
const KEYWORD_TABLE: &[(&str, &[&str])] = &[
    ("earnings", &["earnings", "q1", "q2", "q3", "q4", "quarter", "results", "profit"]),
    ("merger", &["merger", "acquire", "acquisition", "buyout", "takeover"]),
    ("downgrade", &["downgrade", "cut rating", "lowered", "revised down"]),
    ("upgrade", &["upgrade", "raised", "reiterat", "upgraded"]),
    ("lawsuit", &["lawsuit", "sued", "legal", "settlement", "lawsuits"]),
    ("management", &["ceo", "cfo", "resign", "appoint", "appoints", "board"]),
];

pub const DEFAULT_CATEGORY: &str = "other";

const POSITIVE_WORDS: &[&str] = &[
    "bullish", "rally", "surge", "gain", "profit", "growth", "beat",
    "upgrade", "outperform", "strong", "positive", "rise", "increase",
    "breakthrough", "innovation", "success", "exceed", "momentum",
    "buy", "recommend", "optimistic", "record", "high", "advance",
    "dividend", "buyback", "accretive", "upside", "recovery", "rebound",
    "expansion", "robust", "raised", "upgraded", "tailwind",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bearish", "decline", "loss", "fall", "plunge", "crash", "miss",
    "downgrade", "underperform", "weak", "negative", "drop", "decrease",
    "concern", "risk", "fail", "disappoint", "slump", "sell",
    "warning", "pessimistic", "low", "retreat", "fear", "trouble",
    "scandal", "lawsuit", "litigation", "recall", "investigation",
    "default", "bankruptcy", "restructuring", "layoff", "downside",
    "lowered", "suspended", "headwind",
];

const NEGATION_WORDS: &[&str] = &[
    "not", "no", "never", "don't", "doesn't", "didn't", "isn't", "aren't",
    "wasn't", "weren't", "won't", "wouldn't", "couldn't", "shouldn't",
    "hardly", "barely", "neither", "nor", "without",
];

/// A sentiment hit this many words after a negation flips sign.
const NEGATION_WINDOW: usize = 3;

/// Normalization constant for the compound score (VADER convention).
const COMPOUND_ALPHA: f64 = 15.0;

/// Classify text into an event category. Empty or whitespace-only text
/// yields `other`.
pub fn classify(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    for (category, keywords) in KEYWORD_TABLE {
        if keywords.iter().any(|kw| lowered.contains(kw)) {
            return category;
        }
    }
    DEFAULT_CATEGORY
}

/// Compound sentiment in [-1, 1]. Counts lexicon hits with negation
/// handling, then squashes the raw count: s / sqrt(s^2 + alpha).
pub fn score_sentiment(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }

    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.' | '!' | '?' | ':' | '"' | '(' | ')'))
        .filter(|w| !w.is_empty())
        .collect();

    let positive: HashSet<&str> = POSITIVE_WORDS.iter().copied().collect();
    let negative: HashSet<&str> = NEGATIVE_WORDS.iter().copied().collect();
    let negations: HashSet<&str> = NEGATION_WORDS.iter().copied().collect();

    let negation_positions: Vec<usize> = words
        .iter()
        .enumerate()
        .filter(|(_, w)| negations.contains(*w))
        .map(|(i, _)| i)
        .collect();

    let mut raw: f64 = 0.0;
    for (i, word) in words.iter().enumerate() {
        let is_positive = positive.contains(word);
        let is_negative = negative.contains(word);
        if !is_positive && !is_negative {
            continue;
        }

        let negated = negation_positions
            .iter()
            .any(|&pos| pos < i && i - pos <= NEGATION_WINDOW);

        let sign = if is_positive { 1.0 } else { -1.0 };
        raw += if negated { -sign } else { sign };
    }

    raw / (raw * raw + COMPOUND_ALPHA).sqrt()
}
