//! Headline Pulse: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, shared state, feed ingest and metrics.

use std::sync::Arc;

use headline_pulse::config::PulseConfig;
use headline_pulse::headline::HeadlineStore;
use headline_pulse::ingest::providers::RssFeedProvider;
use headline_pulse::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use headline_pulse::ingest::types::FeedProvider;
use headline_pulse::metrics::Metrics;
use headline_pulse::{api, telemetry, AppState};
use shuttle_axum::ShuttleAxum;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    telemetry::init_tracing();

    let cfg = PulseConfig::load()?;

    let headlines = Arc::new(HeadlineStore::new());
    let state = AppState::new(headlines.clone(), &cfg);
    if state.reaction_source.is_none() {
        info!(target: "collect", "no search endpoint configured; reaction collection disabled");
    }

    if cfg.ingest.feeds.is_empty() {
        info!(target: "ingest", "no feeds configured; ingest scheduler not started");
    } else {
        let providers: Vec<Box<dyn FeedProvider>> = cfg
            .ingest
            .feeds
            .iter()
            .map(|f| {
                Box::new(RssFeedProvider::from_url(&f.source, &f.url)) as Box<dyn FeedProvider>
            })
            .collect();
        spawn_scheduler(
            IngestSchedulerCfg {
                interval_secs: cfg.ingest.interval_secs,
                retention_secs: cfg.ingest.retention_secs(),
                refresh_corpus: cfg.ingest.refresh_corpus_after_ingest,
            },
            providers,
            headlines,
            state.corpus.clone(),
        );
    }

    let mut router = api::router(state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => warn!(error = ?e, "metrics recorder not installed; /metrics disabled"),
    }

    Ok(router.into())
}
