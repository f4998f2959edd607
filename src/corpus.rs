//! Corpus model: the background set of headline token bags used for IDF.
//!
//! Readers clone an `Arc` of the current snapshot and never hold the lock
//! while scoring. `refresh()` builds a complete snapshot first and then
//! publishes it with a single pointer swap, so no reader can observe a
//! partially rebuilt corpus.

use anyhow::Result;
use metrics::gauge;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Anything that can hand over all known cleaned headline token bags.
pub trait CorpusSource: Send + Sync {
    fn token_bags(&self) -> Result<Vec<Vec<String>>>;
}

/// Immutable, fully built corpus.
#[derive(Debug, Default, Clone)]
pub struct CorpusSnapshot {
    docs: Vec<Vec<String>>,
    /// word -> number of documents containing it at least once
    doc_freq: HashMap<String, usize>,
}

impl CorpusSnapshot {
    pub fn from_token_bags(docs: Vec<Vec<String>>) -> Self {
        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in &docs {
            let uniq: HashSet<&String> = doc.iter().collect();
            for w in uniq {
                *doc_freq.entry(w.clone()).or_insert(0) += 1;
            }
        }
        Self { docs, doc_freq }
    }

    pub fn size(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn docs_containing(&self, word: &str) -> usize {
        self.doc_freq.get(word).copied().unwrap_or(0)
    }

    pub fn documents(&self) -> &[Vec<String>] {
        &self.docs
    }
}

/// Caller-owned corpus with lazy build and explicit refresh.
pub struct Corpus {
    source: Arc<dyn CorpusSource>,
    current: RwLock<Option<Arc<CorpusSnapshot>>>,
}

impl Corpus {
    pub fn new(source: Arc<dyn CorpusSource>) -> Self {
        Self {
            source,
            current: RwLock::new(None),
        }
    }

    /// Corpus over a fixed set of token bags, already built.
    pub fn from_token_bags(docs: Vec<Vec<String>>) -> Self {
        let snap = Arc::new(CorpusSnapshot::from_token_bags(docs.clone()));
        Self {
            source: Arc::new(StaticBags(docs)),
            current: RwLock::new(Some(snap)),
        }
    }

    /// Load the corpus if it has not been loaded yet. Returns its size.
    pub fn build(&self) -> Result<usize> {
        if let Some(snap) = self.published() {
            return Ok(snap.size());
        }
        self.refresh()
    }

    /// Rebuild from the source and publish the new snapshot.
    ///
    /// On a source error the previously published snapshot stays in place.
    pub fn refresh(&self) -> Result<usize> {
        let bags = self.source.token_bags()?;
        let snap = Arc::new(CorpusSnapshot::from_token_bags(bags));
        let size = snap.size();
        {
            let mut guard = self.current.write().expect("corpus lock poisoned");
            *guard = Some(snap);
        }
        gauge!("corpus_size").set(size as f64);
        info!(target: "corpus", size, "corpus snapshot published");
        Ok(size)
    }

    /// Current snapshot, building lazily on first use.
    ///
    /// A failing first build yields an empty (degenerate) snapshot that is not
    /// cached, so the next call tries again.
    pub fn snapshot(&self) -> Arc<CorpusSnapshot> {
        if let Some(snap) = self.published() {
            return snap;
        }
        if let Err(e) = self.build() {
            warn!(target: "corpus", error = ?e, "corpus build failed; using empty corpus");
            return Arc::new(CorpusSnapshot::default());
        }
        self.published().unwrap_or_default()
    }

    pub fn size(&self) -> usize {
        self.snapshot().size()
    }

    fn published(&self) -> Option<Arc<CorpusSnapshot>> {
        self.current.read().expect("corpus lock poisoned").clone()
    }
}

struct StaticBags(Vec<Vec<String>>);

impl CorpusSource for StaticBags {
    fn token_bags(&self) -> Result<Vec<Vec<String>>> {
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn bag(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[derive(Default)]
    struct Counting {
        bags: Mutex<Vec<Vec<String>>>,
        loads: AtomicUsize,
        fail: Mutex<bool>,
    }

    impl CorpusSource for Counting {
        fn token_bags(&self) -> Result<Vec<Vec<String>>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if *self.fail.lock().unwrap() {
                anyhow::bail!("source offline");
            }
            Ok(self.bags.lock().unwrap().clone())
        }
    }

    #[test]
    fn doc_freq_counts_each_doc_once() {
        let snap = CorpusSnapshot::from_token_bags(vec![
            bag(&["storm", "storm", "coast"]),
            bag(&["storm"]),
            bag(&["markets"]),
        ]);
        assert_eq!(snap.size(), 3);
        assert_eq!(snap.docs_containing("storm"), 2);
        assert_eq!(snap.docs_containing("coast"), 1);
        assert_eq!(snap.docs_containing("absent"), 0);
    }

    #[test]
    fn lazily_built_once_and_cached() {
        let src = Arc::new(Counting::default());
        src.bags.lock().unwrap().push(bag(&["a"]));
        let corpus = Corpus::new(src.clone());
        assert_eq!(src.loads.load(Ordering::SeqCst), 0);

        assert_eq!(corpus.size(), 1);
        assert_eq!(corpus.size(), 1);
        assert_eq!(corpus.build().unwrap(), 1);
        assert_eq!(src.loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn new_data_only_visible_after_refresh() {
        let src = Arc::new(Counting::default());
        src.bags.lock().unwrap().push(bag(&["a"]));
        let corpus = Corpus::new(src.clone());
        assert_eq!(corpus.size(), 1);

        src.bags.lock().unwrap().push(bag(&["b"]));
        assert_eq!(corpus.size(), 1);
        assert_eq!(corpus.refresh().unwrap(), 2);
        assert_eq!(corpus.size(), 2);
    }

    #[test]
    fn held_snapshot_survives_refresh() {
        let src = Arc::new(Counting::default());
        src.bags.lock().unwrap().push(bag(&["a"]));
        let corpus = Corpus::new(src.clone());
        let old = corpus.snapshot();

        src.bags.lock().unwrap().push(bag(&["b"]));
        corpus.refresh().unwrap();
        assert_eq!(old.size(), 1);
        assert_eq!(corpus.snapshot().size(), 2);
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let src = Arc::new(Counting::default());
        src.bags.lock().unwrap().push(bag(&["a"]));
        let corpus = Corpus::new(src.clone());
        corpus.build().unwrap();

        *src.fail.lock().unwrap() = true;
        assert!(corpus.refresh().is_err());
        assert_eq!(corpus.size(), 1);
    }

    #[test]
    fn failed_first_build_is_degenerate_not_fatal() {
        let src = Arc::new(Counting::default());
        *src.fail.lock().unwrap() = true;
        let corpus = Corpus::new(src.clone());
        assert_eq!(corpus.size(), 0);

        *src.fail.lock().unwrap() = false;
        src.bags.lock().unwrap().push(bag(&["a"]));
        assert_eq!(corpus.size(), 1);
    }

    #[test]
    fn empty_source_gives_size_zero() {
        let corpus = Corpus::from_token_bags(Vec::new());
        assert_eq!(corpus.size(), 0);
        assert!(corpus.snapshot().is_empty());
    }
}
