//! Sentiment polarity for reactions that arrive without one.
//!
//! The aggregator only needs a number in [-1, 1] per text; `PolarityScorer`
//! is the seam for swapping in a better model.

use once_cell::sync::Lazy;
use std::collections::HashMap;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).expect("valid sentiment lexicon")
});

/// Largest absolute lexicon weight; used to scale sums into [-1, 1].
const MAX_WEIGHT: f64 = 3.0;

pub trait PolarityScorer: Send + Sync {
    /// Polarity of `text` in [-1, 1], positive meaning favorable.
    fn polarity(&self, text: &str) -> f64;
}

#[derive(Debug, Clone, Default)]
pub struct LexiconPolarity;

impl LexiconPolarity {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (summed score, number of lexicon hits).
    /// A negator within the previous 1..=3 tokens flips the sign of a hit.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score: i32 = 0;
        let mut hits = 0usize;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
            hits += 1;
        }

        (score, hits)
    }
}

impl PolarityScorer for LexiconPolarity {
    fn polarity(&self, text: &str) -> f64 {
        let (score, hits) = self.score_text(text);
        if hits == 0 {
            return 0.0;
        }
        (score as f64 / (MAX_WEIGHT * hits as f64)).clamp(-1.0, 1.0)
    }
}

/// How emotionally loaded a headline is, regardless of direction.
pub fn headline_intensity(scorer: &dyn PolarityScorer, text: &str) -> f64 {
    scorer.polarity(text).abs()
}

/// Alphanumeric tokens (apostrophes kept), lower-case.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "don't"
            | "without"
    )
}
