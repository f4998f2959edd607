// src/ingest/scheduler.rs
use std::sync::Arc;

use crate::corpus::Corpus;
use crate::headline::HeadlineStore;
use crate::ingest::types::FeedProvider;
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug)]
pub struct IngestSchedulerCfg {
    pub interval_secs: u64,
    pub retention_secs: i64,
    /// Publish a fresh corpus snapshot after every pass.
    pub refresh_corpus: bool,
}

/// Spawn a background task that runs an ingest pass on every tick.
pub fn spawn_scheduler(
    cfg: IngestSchedulerCfg,
    providers: Vec<Box<dyn FeedProvider>>,
    store: Arc<HeadlineStore>,
    corpus: Arc<Corpus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::time::Duration::from_secs(cfg.interval_secs.max(1));
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp();

            let report =
                crate::ingest::run_once(&providers, &store, now, cfg.retention_secs).await;

            if cfg.refresh_corpus && (report.inserted > 0 || report.pruned > 0) {
                if let Err(e) = corpus.refresh() {
                    tracing::warn!(target: "ingest", error = ?e, "corpus refresh after ingest failed");
                }
            }
        }
    })
}
