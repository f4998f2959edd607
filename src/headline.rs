//! Headlines and their in-memory store.
//!
//! The store keeps insertion order, which is also the order of the corpus
//! built from it.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::corpus::CorpusSource;
use crate::text::clean_headline;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub id: String,
    pub source: String,
    pub text: String,
    /// Cleaned token bag, in headline order.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Unix seconds.
    pub publish_time: i64,
}

impl Headline {
    /// Build a headline and derive its tokens from `text`.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        text: impl Into<String>,
        publish_time: i64,
    ) -> Self {
        let text = text.into();
        let tokens = clean_headline(&text);
        Self {
            id: id.into(),
            source: source.into(),
            text,
            tokens,
            publish_time,
        }
    }

    /// Boundary check for caller-supplied headlines.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("headline id must not be empty");
        }
        if self.publish_time < 0 {
            bail!(
                "headline `{}` has negative publish_time {}",
                self.id,
                self.publish_time
            );
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct HeadlineStore {
    inner: RwLock<Vec<Headline>>,
}

impl HeadlineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, headline: Headline) {
        let mut v = self.inner.write().expect("headline store lock poisoned");
        v.push(headline);
    }

    pub fn get(&self, id: &str) -> Option<Headline> {
        let v = self.inner.read().expect("headline store lock poisoned");
        v.iter().find(|h| h.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("headline store lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Publish time of the newest stored headline from `source`.
    pub fn latest_time(&self, source: &str) -> Option<i64> {
        let v = self.inner.read().expect("headline store lock poisoned");
        v.iter()
            .filter(|h| h.source == source)
            .map(|h| h.publish_time)
            .max()
    }

    /// Drop every headline published at or before `cutoff`. Returns how many went.
    pub fn prune_older_than(&self, cutoff: i64) -> usize {
        let mut v = self.inner.write().expect("headline store lock poisoned");
        let before = v.len();
        v.retain(|h| h.publish_time > cutoff);
        before - v.len()
    }

    /// Headlines with `start < publish_time < end`.
    pub fn published_between(&self, start: i64, end: i64) -> Vec<Headline> {
        let v = self.inner.read().expect("headline store lock poisoned");
        v.iter()
            .filter(|h| h.publish_time > start && h.publish_time < end)
            .cloned()
            .collect()
    }

    /// Headlines published during the given UTC calendar day.
    pub fn for_day(&self, day: NaiveDate) -> Vec<Headline> {
        let Some(midnight) = day.and_hms_opt(0, 0, 0) else {
            return Vec::new();
        };
        let start = midnight.and_utc().timestamp();
        self.published_between(start, start + 86_400)
    }
}

impl CorpusSource for HeadlineStore {
    fn token_bags(&self) -> Result<Vec<Vec<String>>> {
        let v = self.inner.read().expect("headline store lock poisoned");
        Ok(v.iter().map(|h| h.tokens.clone()).collect())
    }
}
