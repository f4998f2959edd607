//! Headline cleaning: lower-case, strip stray punctuation, drop English stopwords.
//!
//! Scoring and bucketing only ever see the token bags produced here; no
//! lemmatization is applied.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Characters removed from inside every word.
const STOP_CHARS: [char; 8] = [',', '.', '?', '!', ';', ':', '\'', '"'];

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can",
        "will", "just", "don", "should", "now",
    ]
    .into_iter()
    .collect()
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word)
}

/// Lower-case a single word and drop stop characters.
pub fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| !STOP_CHARS.contains(c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Turn a raw headline into its ordered bag of cleaned tokens.
pub fn clean_headline(headline: &str) -> Vec<String> {
    headline
        .split_whitespace()
        .map(clean_word)
        .filter(|w| !w.is_empty() && !is_stopword(w))
        .collect()
}
