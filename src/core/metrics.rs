use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder when `PROMETHEUS_ENABLED` is set.
///
/// A CLI run has no scrape endpoint, so the recorder only backs the
/// snapshot that [`render`] hands back when the command finishes.
pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    if PROM_HANDLE.set(handle).is_err() {
        tracing::debug!("Prometheus recorder already installed");
    }
    Ok(())
}

/// Text exposition of every API call and poll made during this run.
pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// `outcome` is one of `success`, `transport_error`, `http_error`, `decode_error`.
pub(crate) fn record_request(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!("api_requests_total", "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
}

pub(crate) fn record_poll(outcome: &'static str) {
    metrics::counter!("batch_polls_total", "outcome" => outcome).increment(1);
}
