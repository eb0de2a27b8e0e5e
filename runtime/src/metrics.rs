//! Prometheus metrics for observability and monitoring.
//!
//! This module names and describes every metric the service records:
//! - Endpoint calls (count and latency, per operation and outcome)
//! - Event bus publish and consume counts
//!
//! # Example
//!
//! ```rust,no_run
//! use todokit_runtime::metrics::MetricsExporter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let exporter = MetricsExporter::install()?;
//!
//! // Serve this from GET /metrics
//! let body = exporter.render();
//! # Ok(())
//! # }
//! ```

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use thiserror::Error;

/// Endpoint calls, labelled `operation` and `outcome`.
pub const ENDPOINT_REQUESTS_TOTAL: &str = "todo_endpoint_requests_total";

/// Endpoint latency, labelled `operation`.
pub const ENDPOINT_REQUEST_DURATION_SECONDS: &str = "todo_endpoint_request_duration_seconds";

/// Events published on the in-process bus, labelled `topic`.
pub const EVENTS_PUBLISHED_TOTAL: &str = "todo_events_published_total";

/// Events handled by consumers, labelled `consumer` and `outcome`.
pub const EVENTS_CONSUMED_TOTAL: &str = "todo_events_consumed_total";

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to build metrics exporter
    #[error("Failed to build metrics exporter: {0}")]
    Build(String),
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Process-wide Prometheus recorder.
pub struct MetricsExporter {
    handle: PrometheusHandle,
}

impl MetricsExporter {
    /// Describe all metrics and install the Prometheus recorder globally.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError::Install`] if a global recorder is already
    /// installed.
    pub fn install() -> Result<Self, MetricsError> {
        let handle = builder()?
            .install_recorder()
            .map_err(|e| MetricsError::Install(e.to_string()))?;

        register_metrics();

        tracing::info!("Prometheus metrics recorder installed");
        Ok(Self { handle })
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> &PrometheusHandle {
        &self.handle
    }

    /// Render current metrics in Prometheus text format.
    #[must_use]
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// A recorder with the service's bucket configuration that is not installed
/// globally, for use with [`metrics::with_local_recorder`].
///
/// # Errors
///
/// Returns [`MetricsError::Build`] if the bucket configuration is rejected.
pub fn build_recorder() -> Result<PrometheusRecorder, MetricsError> {
    Ok(builder()?.build_recorder())
}

fn builder() -> Result<PrometheusBuilder, MetricsError> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .map_err(|e| MetricsError::Build(e.to_string()))
}

/// Register all metric descriptions with the current recorder.
pub fn register_metrics() {
    describe_counter!(
        ENDPOINT_REQUESTS_TOTAL,
        "Total number of endpoint calls by operation and outcome"
    );
    describe_histogram!(
        ENDPOINT_REQUEST_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Time taken to serve an endpoint call"
    );
    describe_counter!(
        EVENTS_PUBLISHED_TOTAL,
        "Total number of events published by topic"
    );
    describe_counter!(
        EVENTS_CONSUMED_TOTAL,
        "Total number of events handled by consumers by outcome"
    );
}
