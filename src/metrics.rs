//! Run metrics for the annotator.
//!
//! A Prometheus recorder is installed in-process (no HTTP listener: runs are short) and the
//! rendered snapshot can be pushed to a Pushgateway when one is configured.

use crate::error::{AnnotatorError, Result};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use reqwest::Url;
use std::sync::OnceLock;
use tracing::{info, warn};

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Naming convention: annotator_{phase}_{metric_name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("annotator_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("annotator_", $phase, "_", $name)
    };
}

/// Install the global recorder. Idempotent.
pub fn init_metrics() {
    if HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            AnnotatorMetrics::register_metrics();
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    }
}

pub struct AnnotatorMetrics;

impl AnnotatorMetrics {
    fn register_metrics() {
        let _ = ::metrics::counter!(phase_metric!(counter, "reader", "records"));
        let _ = ::metrics::counter!(phase_metric!(counter, "reader", "malformed_lines"));
        let _ = ::metrics::counter!(phase_metric!(counter, "fetch", "requests"));
        let _ = ::metrics::counter!(phase_metric!(counter, "fetch", "request_errors"));
        let _ = ::metrics::counter!(phase_metric!(counter, "fetch", "unresolved"));
        let _ = ::metrics::counter!(phase_metric!(counter, "fetch", "cache_hits"));
        let _ = ::metrics::counter!(phase_metric!(counter, "sink", "documents"));
        let _ = ::metrics::histogram!(phase_metric!(histogram, "fetch", "request_duration_seconds"));
        let _ = ::metrics::histogram!(phase_metric!(histogram, "pipeline", "duration_seconds"));
    }

    pub fn record_record_read() {
        ::metrics::counter!(phase_metric!(counter, "reader", "records")).increment(1);
    }

    pub fn record_malformed_line() {
        ::metrics::counter!(phase_metric!(counter, "reader", "malformed_lines")).increment(1);
    }

    pub fn record_request(endpoint: &'static str, duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "fetch", "requests"), "endpoint" => endpoint).increment(1);
        ::metrics::histogram!(
            phase_metric!(histogram, "fetch", "request_duration_seconds"),
            "endpoint" => endpoint
        )
        .record(duration_secs);
    }

    pub fn record_request_error(endpoint: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "fetch", "request_errors"), "endpoint" => endpoint)
            .increment(1);
    }

    pub fn record_unresolved() {
        ::metrics::counter!(phase_metric!(counter, "fetch", "unresolved")).increment(1);
    }

    pub fn record_cache_hit() {
        ::metrics::counter!(phase_metric!(counter, "fetch", "cache_hits")).increment(1);
    }

    pub fn record_documents_inserted(count: usize) {
        ::metrics::counter!(phase_metric!(counter, "sink", "documents")).increment(count as u64);
    }

    pub fn record_pipeline_duration(duration_secs: f64) {
        ::metrics::histogram!(phase_metric!(histogram, "pipeline", "duration_seconds")).record(duration_secs);
    }
}

/// Grouping-key URL `{base}/metrics/job/clinvar_annotator/instance/{instance}`, with the
/// instance percent-encoded as a single path segment.
pub fn pushgateway_url(base: &str, instance: &str) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| AnnotatorError::Config(format!("invalid pushgateway url '{}': {}", base, e)))?;
    url.path_segments_mut()
        .map_err(|_| AnnotatorError::Config(format!("pushgateway url '{}' cannot be a base", base)))?
        .pop_if_empty()
        .extend(["metrics", "job", "clinvar_annotator", "instance", instance]);
    Ok(url)
}

/// Push the current snapshot to the run's Pushgateway grouping key.
///
/// Failures are logged and never fail the run.
pub async fn push_to_pushgateway(base: &str, instance: &str) {
    let Some(handle) = HANDLE.get() else {
        warn!("pushgateway: metrics recorder not installed, skipping push");
        return;
    };
    let push_url = match pushgateway_url(base, instance) {
        Ok(url) => url,
        Err(e) => {
            warn!("Skipping metrics push: {}", e);
            return;
        }
    };
    let body = handle.render();

    let client = reqwest::Client::new();
    match client
        .post(push_url)
        .header("Content-Type", "text/plain; version=0.0.4")
        .body(body)
        .send()
        .await
    {
        Ok(r) if r.status().is_success() => info!("Pushed metrics to Pushgateway for {}", instance),
        Ok(r) => warn!("Pushgateway responded with status {} for {}", r.status().as_u16(), instance),
        Err(e) => warn!("Failed to push metrics to Pushgateway for {}: {}", instance, e),
    }
}
