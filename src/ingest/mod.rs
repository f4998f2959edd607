// src/ingest/mod.rs
//! Headline ingest: pull feed items, keep only unseen ones, clean them into
//! headlines, and apply the retention window.

pub mod providers;
pub mod scheduler;
pub mod types;

use crate::headline::{Headline, HeadlineStore};
use crate::ingest::types::{FeedItem, FeedProvider};
use metrics::counter;
use once_cell::sync::OnceCell;
use std::collections::HashMap;

/// Normalize text: decode entities, strip tags, unify quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Normalize “ ” ‘ ’ « » to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// What a single ingest pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub inserted: usize,
    pub stale: usize,
    pub undated: usize,
    pub pruned: usize,
    pub provider_errors: usize,
}

/// Insert the items newer than what the store already holds for their source.
///
/// The per-source high-water mark is read once before inserting, so several new
/// items from one feed all get in regardless of their order in the feed.
pub fn insert_new_items(store: &HeadlineStore, items: Vec<FeedItem>, report: &mut IngestReport) {
    let mut watermark: HashMap<String, Option<i64>> = HashMap::new();

    for item in items {
        let Some(published) = item.published else {
            report.undated += 1;
            continue;
        };
        let last = *watermark
            .entry(item.source.clone())
            .or_insert_with(|| store.latest_time(&item.source));
        if last.is_some_and(|t| published <= t) {
            report.stale += 1;
            continue;
        }

        let id = format!("{}-{}-{}", item.source, published, store.len());
        store.insert(Headline::new(id, item.source, item.title, published));
        report.inserted += 1;
    }
}

/// Run ingest once: fetch every provider, insert unseen headlines, prune old ones.
pub async fn run_once(
    providers: &[Box<dyn FeedProvider>],
    store: &HeadlineStore,
    now: i64,
    retention_secs: i64,
) -> IngestReport {
    crate::metrics::ensure_metrics_described();

    let mut report = IngestReport::default();
    for p in providers {
        match p.fetch_latest().await {
            Ok(items) => insert_new_items(store, items, &mut report),
            Err(e) => {
                tracing::warn!(target: "ingest", error = ?e, provider = p.name(), "provider error");
                counter!("ingest_provider_errors_total").increment(1);
                report.provider_errors += 1;
            }
        }
    }

    report.pruned = store.prune_older_than(now.saturating_sub(retention_secs));

    counter!("headlines_ingested_total").increment(report.inserted as u64);
    counter!("headlines_pruned_total").increment(report.pruned as u64);
    tracing::info!(
        target: "ingest",
        inserted = report.inserted,
        stale = report.stale,
        undated = report.undated,
        pruned = report.pruned,
        errors = report.provider_errors,
        "ingest pass finished"
    );

    report
}
