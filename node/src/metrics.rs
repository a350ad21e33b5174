//! # Prometheus Metrics
//!
//! Exposes operational metrics for the DocuChain node. Scraped by
//! Prometheus at the `/metrics` HTTP endpoint on the API listener.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] under
//! the `docuchain` namespace so they do not collide with any default global
//! registry consumers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Prometheus handles are reference-counted internally, so clones share
/// the same underlying series.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Documents successfully anchored in the ledger.
    pub documents_issued_total: IntCounter,
    /// Verification requests, labelled `outcome="valid" | "invalid"`.
    pub verifications_total: IntCounterVec,
    /// Number of blocks in the ledger, genesis included.
    pub chain_length: IntGauge,
    /// Wall time of each append, sealing included.
    pub seal_duration_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("docuchain".into()), None)?;

        let documents_issued_total = IntCounter::new(
            "documents_issued_total",
            "Total number of documents anchored in the ledger",
        )?;
        registry.register(Box::new(documents_issued_total.clone()))?;

        let verifications_total = IntCounterVec::new(
            Opts::new(
                "verifications_total",
                "Total number of document verification requests by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(verifications_total.clone()))?;

        let chain_length = IntGauge::new(
            "chain_length",
            "Number of blocks in the ledger, genesis included",
        )?;
        registry.register(Box::new(chain_length.clone()))?;

        let seal_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "seal_duration_seconds",
                "Time spent sealing, appending and saving one block, in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0,
            ]),
        )?;
        registry.register(Box::new(seal_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            documents_issued_total,
            verifications_total,
            chain_length,
            seal_duration_seconds,
        })
    }

    /// Record one verification outcome.
    pub fn record_verification(&self, valid: bool) {
        let outcome = if valid { "valid" } else { "invalid" };
        self.verifications_total.with_label_values(&[outcome]).inc();
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics handle.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails.
pub async fn metrics_handler(State(metrics): State<SharedMetrics>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
