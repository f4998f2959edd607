//! Corpus-relative TF-IDF scoring of headline words.
//!
//! `idf = ln(N / (1 + df))`. A word found in every document therefore gets a
//! negative idf and is pushed below words the corpus has never seen.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::corpus::CorpusSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermScore {
    pub word: String,
    pub score: f64,
}

impl TermScore {
    pub fn new(word: impl Into<String>, score: f64) -> Self {
        Self {
            word: word.into(),
            score,
        }
    }
}

/// Share of `doc` taken up by `word`; 0 for an empty document.
pub fn term_frequency(word: &str, doc: &[String]) -> f64 {
    if doc.is_empty() {
        return 0.0;
    }
    let hits = doc.iter().filter(|w| w.as_str() == word).count();
    hits as f64 / doc.len() as f64
}

/// `ln(N / (1 + df))`. Callers must not pass an empty corpus.
pub fn inverse_doc_frequency(word: &str, corpus: &CorpusSnapshot) -> f64 {
    let n = corpus.size() as f64;
    let df = corpus.docs_containing(word) as f64;
    (n / (1.0 + df)).ln()
}

pub fn score(word: &str, doc: &[String], corpus: &CorpusSnapshot) -> f64 {
    let tf = term_frequency(word, doc);
    if tf == 0.0 {
        return 0.0;
    }
    tf * inverse_doc_frequency(word, corpus)
}

/// Score every distinct word of `tokens`, highest first.
///
/// Ties keep first-occurrence order. An empty corpus yields no scores.
pub fn score_headline(tokens: &[String], corpus: &CorpusSnapshot) -> Vec<TermScore> {
    if corpus.is_empty() {
        return Vec::new();
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for w in tokens {
        if seen.insert(w.as_str()) {
            out.push(TermScore::new(w.clone(), score(w, tokens, corpus)));
        }
    }

    // stable: equal scores stay in headline order
    out.sort_by(|a, b| b.score.total_cmp(&a.score));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn corpus() -> CorpusSnapshot {
        CorpusSnapshot::from_token_bags(vec![
            bag(&["storm", "hits", "coast"]),
            bag(&["storm", "markets", "fall"]),
            bag(&["storm", "election", "results"]),
            bag(&["markets", "rally"]),
        ])
    }

    #[test]
    fn tf_counts_repeats() {
        let doc = bag(&["a", "b", "a", "c"]);
        assert!((term_frequency("a", &doc) - 0.5).abs() < 1e-12);
        assert_eq!(term_frequency("z", &doc), 0.0);
        assert_eq!(term_frequency("a", &[]), 0.0);
    }

    #[test]
    fn idf_matches_formula() {
        let c = corpus();
        assert!((inverse_doc_frequency("rally", &c) - (4.0f64 / 2.0).ln()).abs() < 1e-12);
        assert!((inverse_doc_frequency("unseen", &c) - 4.0f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn ubiquitous_word_has_non_positive_idf() {
        let c = CorpusSnapshot::from_token_bags(vec![
            bag(&["war", "a"]),
            bag(&["war", "b"]),
            bag(&["war"]),
        ]);
        let idf = inverse_doc_frequency("war", &c);
        assert!(idf < 0.0, "idf was {idf}");
        assert!((idf - (3.0f64 / 4.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn idf_never_increases_with_document_count() {
        let c = corpus();
        let rare = inverse_doc_frequency("rally", &c); // df 1
        let mid = inverse_doc_frequency("markets", &c); // df 2
        let common = inverse_doc_frequency("storm", &c); // df 3
        assert!(rare >= mid && mid >= common);
    }

    #[test]
    fn zero_tf_means_zero_score() {
        let c = corpus();
        let doc = bag(&["storm", "coast"]);
        assert_eq!(score("markets", &doc, &c), 0.0);
    }

    #[test]
    fn headline_scores_sorted_desc_distinct() {
        let c = corpus();
        let doc = bag(&["storm", "flood", "storm", "coast"]);
        let scored = score_headline(&doc, &c);
        let words: Vec<&str> = scored.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["flood", "coast", "storm"]);
        assert!(scored.windows(2).all(|w| w[0].score >= w[1].score));
        // storm appears in 3 of 4 docs -> ln(4/4) = 0
        assert_eq!(scored[2].score, 0.0);
    }

    #[test]
    fn ties_keep_headline_order() {
        let c = corpus();
        let doc = bag(&["zeta", "alpha", "mid"]);
        let scored = score_headline(&doc, &c);
        let words: Vec<&str> = scored.iter().map(|t| t.word.as_str()).collect();
        assert_eq!(words, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn empty_corpus_or_tokens_yield_nothing() {
        let empty = CorpusSnapshot::default();
        assert!(score_headline(&bag(&["storm"]), &empty).is_empty());
        assert!(score_headline(&[], &corpus()).is_empty());
    }
}
