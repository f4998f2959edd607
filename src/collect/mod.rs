//! Paginated reaction collection for a (headline, search term) pair.
//!
//! The search API is windowed by id: `since_id` is an exclusive lower bound,
//! `max_id` an inclusive upper bound, and results come newest first. A run
//! walks backwards page by page until the cap is reached, a page comes back
//! empty, or the source fails. Failures end the run; there is no retry.

pub mod http;

pub use http::HttpSearchSource;

use anyhow::Result;
use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::{info, warn};

use crate::config::CollectCfg;
use crate::headline::Headline;
use crate::reaction::{CreatedAt, Reaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub term: String,
    pub count: usize,
    pub max_id: Option<u64>,
    pub since_id: Option<u64>,
}

/// A search hit as returned by the reaction source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedReaction {
    pub id: u64,
    #[serde(alias = "full_text")]
    pub text: String,
    #[serde(default)]
    pub created_at: CreatedAt,
}

#[async_trait]
pub trait ReactionSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<FetchedReaction>>;
    fn name(&self) -> &str;
}

/// In-memory reaction persistence keyed by (headline id, search term).
#[derive(Debug, Default)]
pub struct ReactionStore {
    inner: RwLock<HashMap<(String, String), Vec<Reaction>>>,
}

impl ReactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn saved_ids(&self, headline_id: &str, term: &str) -> HashSet<u64> {
        let m = self.inner.read().expect("reaction store lock poisoned");
        m.get(&(headline_id.to_string(), term.to_string()))
            .map(|v| v.iter().map(|r| r.id).collect())
            .unwrap_or_default()
    }

    /// Store `reaction` under its pair unless that id is already there.
    pub fn insert(&self, reaction: Reaction) -> bool {
        let mut m = self.inner.write().expect("reaction store lock poisoned");
        let key = (reaction.headline_id.clone(), reaction.search_term.clone());
        let v = m.entry(key).or_default();
        if v.iter().any(|r| r.id == reaction.id) {
            return false;
        }
        v.push(reaction);
        true
    }

    pub fn for_pair(&self, headline_id: &str, term: &str) -> Vec<Reaction> {
        let m = self.inner.read().expect("reaction store lock poisoned");
        m.get(&(headline_id.to_string(), term.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    /// Id of the newest stored reaction (any pair) created before `time`.
    pub fn latest_id_before(&self, time: i64) -> Option<u64> {
        let m = self.inner.read().expect("reaction store lock poisoned");
        m.values()
            .flatten()
            .filter_map(|r| r.created_at.epoch_seconds().map(|t| (t, r.id)))
            .filter(|(t, _)| *t < time)
            .max()
            .map(|(_, id)| id)
    }

    pub fn len(&self) -> usize {
        let m = self.inner.read().expect("reaction store lock poisoned");
        m.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectReport {
    pub pages: usize,
    pub fetched: usize,
    pub stored: usize,
    pub failed: bool,
}

/// Collect reactions for `term` about `headline` into `store`.
pub async fn collect_reactions(
    source: &dyn ReactionSource,
    store: &ReactionStore,
    headline: &Headline,
    term: &str,
    limits: CollectCfg,
) -> CollectReport {
    let saved = store.saved_ids(&headline.id, term);
    let since_id = saved
        .iter()
        .copied()
        .max()
        .or_else(|| store.latest_id_before(headline.publish_time));

    let mut report = CollectReport::default();
    let mut max_id: Option<u64> = None;

    while report.fetched < limits.max_reactions {
        let query = SearchQuery {
            term: term.to_string(),
            count: limits.per_query.max(1),
            max_id,
            since_id,
        };
        let page = match source.search(&query).await {
            Ok(p) => p,
            Err(e) => {
                warn!(target: "collect", error = ?e, source = source.name(), "search failed; ending run");
                report.failed = true;
                break;
            }
        };
        let Some(last) = page.last() else {
            break;
        };
        let oldest = last.id;

        report.pages += 1;
        report.fetched += page.len();
        for hit in page {
            if saved.contains(&hit.id) {
                continue;
            }
            let r = Reaction::new(hit.id, hit.text, hit.created_at).for_pair(&headline.id, term);
            if store.insert(r) {
                report.stored += 1;
            }
        }

        // next page: strictly older than anything seen so far
        match oldest.checked_sub(1) {
            Some(next) => max_id = Some(next),
            None => break,
        }
    }

    counter!("reactions_collected_total").increment(report.stored as u64);
    info!(
        target: "collect",
        headline = %headline.id,
        pages = report.pages,
        fetched = report.fetched,
        stored = report.stored,
        failed = report.failed,
        "collection run finished"
    );
    report
}
