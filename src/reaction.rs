//! Reactions to a headline and the filters that decide which ones count.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::headline::Headline;

/// Creation time as delivered by the reaction source.
///
/// `Invalid` holds any other JSON value (null, bool, object) so one bad row
/// does not reject the whole batch; it is dropped later as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CreatedAt {
    Epoch(i64),
    EpochFrac(f64),
    Text(String),
    Invalid(serde_json::Value),
}

impl Default for CreatedAt {
    fn default() -> Self {
        CreatedAt::Invalid(serde_json::Value::Null)
    }
}

impl CreatedAt {
    /// Unix seconds, or `None` when the value cannot be interpreted.
    pub fn epoch_seconds(&self) -> Option<i64> {
        match self {
            CreatedAt::Epoch(s) => Some(*s),
            CreatedAt::EpochFrac(f) if f.is_finite() => Some(f.floor() as i64),
            CreatedAt::EpochFrac(_) => None,
            CreatedAt::Text(s) => parse_timestamp(s),
            CreatedAt::Invalid(_) => None,
        }
    }
}

impl From<i64> for CreatedAt {
    fn from(s: i64) -> Self {
        CreatedAt::Epoch(s)
    }
}

/// Accepts integer seconds, RFC 3339, RFC 2822 and the
/// `Wed Oct 10 20:19:24 +0000 2018` social-API layout.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<i64>() {
        return Some(secs);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).timestamp());
    }
    DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y")
        .ok()
        .map(|dt| dt.with_timezone(&Utc).timestamp())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub created_at: CreatedAt,
    /// Missing polarity is filled in by a `PolarityScorer` at summary time.
    #[serde(default)]
    pub polarity: Option<f64>,
    #[serde(default)]
    pub headline_id: String,
    #[serde(default)]
    pub search_term: String,
}

impl Reaction {
    pub fn new(id: u64, text: impl Into<String>, created_at: impl Into<CreatedAt>) -> Self {
        Self {
            id,
            text: text.into(),
            created_at: created_at.into(),
            polarity: None,
            headline_id: String::new(),
            search_term: String::new(),
        }
    }

    pub fn with_polarity(mut self, p: f64) -> Self {
        self.polarity = Some(p);
        self
    }

    pub fn for_pair(mut self, headline_id: impl Into<String>, term: impl Into<String>) -> Self {
        self.headline_id = headline_id.into();
        self.search_term = term.into();
        self
    }
}

/// Why a reaction was left out of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Malformed,
    Duplicate,
    PrePublish,
}

/// Cut a reaction text from its first link onward.
pub fn strip_url_suffix(text: &str) -> &str {
    static RE_URL: OnceCell<Regex> = OnceCell::new();
    let re = RE_URL.get_or_init(|| Regex::new(r"(?i)https?://").expect("url regex"));
    match re.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    }
}

/// A reaction that only repeats the headline, optionally followed by a link.
pub fn is_near_duplicate(reaction_text: &str, headline_text: &str) -> bool {
    let r = strip_url_suffix(reaction_text).trim().to_lowercase();
    let h = headline_text.trim().to_lowercase();
    r == h
}

/// Check a reaction against its headline. `Ok` carries the creation time.
pub fn check_reaction(reaction: &Reaction, headline: &Headline) -> Result<i64, Rejection> {
    let Some(ts) = reaction.created_at.epoch_seconds() else {
        return Err(Rejection::Malformed);
    };
    if ts < headline.publish_time {
        return Err(Rejection::PrePublish);
    }
    if is_near_duplicate(&reaction.text, &headline.text) {
        return Err(Rejection::Duplicate);
    }
    Ok(ts)
}
