use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder, describe the counters the
    /// classification pipeline emits, and set a static gauge with the number
    /// of watchlist entries loaded at boot.
    pub fn init(watchlist_size: usize) -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "classifications_llm_total",
            "Messages classified via the LLM path"
        );
        describe_counter!(
            "classifications_rules_total",
            "Messages classified via the rule-based fallback"
        );
        describe_counter!(
            "classifications_scam_total",
            "Messages classified as SCAM"
        );
        describe_counter!(
            "inference_failures_total",
            "Failed calls to the inference endpoint"
        );
        describe_counter!(
            "scam_log_records_total",
            "Records appended to the scam log"
        );
        describe_gauge!("watchlist_entries", "Watchlist entries loaded at boot");

        gauge!("watchlist_entries").set(watchlist_size as f64);

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
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
