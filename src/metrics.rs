use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder (once per process) and describe all series.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "reactions_received_total",
            "Reactions handed to the timeline summarizer."
        );
        describe_counter!(
            "reactions_duplicate_total",
            "Reactions dropped as copies of the headline."
        );
        describe_counter!(
            "reactions_prepublish_total",
            "Reactions dropped for predating the headline."
        );
        describe_counter!(
            "reactions_malformed_total",
            "Reactions dropped for unusable timestamp or polarity."
        );
        describe_counter!(
            "summaries_no_data_total",
            "Summaries that ended without any valid reaction."
        );
        describe_counter!("sargs_requests_total", "Sarg selections performed.");
        describe_counter!("headlines_ingested_total", "Headlines added by feed ingest.");
        describe_counter!("headlines_pruned_total", "Headlines removed by retention.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed provider fetch/parse errors."
        );
        describe_counter!(
            "reactions_collected_total",
            "New reactions stored by the collector."
        );
        describe_gauge!("corpus_size", "Documents in the published corpus snapshot.");
    });
}
