//! Salient term ("sarg") selection over scored headline words.

use metrics::counter;
use tracing::debug;

use crate::corpus::CorpusSnapshot;
use crate::tfidf::{score_headline, TermScore};

/// Keep every term scoring at or above `cutoff`, in the given order.
///
/// Without a cutoff the median of all scores is used, which keeps roughly the
/// top half of the headline regardless of the absolute score range.
pub fn select_sargs(scored: &[TermScore], cutoff: Option<f64>) -> Vec<TermScore> {
    let Some(cut) = cutoff.or_else(|| median(scored)) else {
        return Vec::new();
    };
    scored
        .iter()
        .filter(|t| t.score >= cut)
        .cloned()
        .collect()
}

/// Median of the scores; mean of the two middle values for even lengths.
pub fn median(scored: &[TermScore]) -> Option<f64> {
    if scored.is_empty() {
        return None;
    }
    let mut v: Vec<f64> = scored.iter().map(|t| t.score).collect();
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

/// Space-joined search string for the reaction source.
pub fn sargs_query(sargs: &[TermScore]) -> String {
    sargs
        .iter()
        .map(|t| t.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Score a headline's tokens against the corpus and select its sargs.
pub fn sargs_for_tokens(
    tokens: &[String],
    corpus: &CorpusSnapshot,
    cutoff: Option<f64>,
) -> Vec<TermScore> {
    counter!("sargs_requests_total").increment(1);
    let scored = score_headline(tokens, corpus);
    let sargs = select_sargs(&scored, cutoff);
    debug!(
        target: "sargs",
        corpus = corpus.size(),
        scored = scored.len(),
        selected = sargs.len(),
        adaptive = cutoff.is_none(),
        "sargs selected"
    );
    sargs
}
