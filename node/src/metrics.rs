//! # Prometheus Metrics
//!
//! Operational counters for the verifier, scraped at `/metrics` on the
//! metrics port. Everything lives in a dedicated [`prometheus::Registry`]
//! with the `scholar` prefix.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct NodeMetrics {
    registry: Registry,
    /// Challenge sessions handed out by `/request-challenge`.
    pub challenges_issued_total: IntCounter,
    /// Proofs that verified and consumed their session.
    pub proofs_accepted_total: IntCounter,
    /// Proofs that failed verification or had no live session.
    pub proofs_rejected_total: IntCounter,
    /// Credentials bound into the registry.
    pub credentials_registered_total: IntCounter,
    /// Time spent verifying a single proof.
    pub verification_latency_seconds: Histogram,
}

fn counter(registry: &Registry, name: &str, help: &str) -> Result<IntCounter, prometheus::Error> {
    let c = IntCounter::new(name, help)?;
    registry.register(Box::new(c.clone()))?;
    Ok(c)
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("scholar".into()), None)?;

        let challenges_issued_total = counter(
            &registry,
            "challenges_issued_total",
            "Total number of challenge sessions issued",
        )?;
        let proofs_accepted_total = counter(
            &registry,
            "proofs_accepted_total",
            "Total number of proofs accepted",
        )?;
        let proofs_rejected_total = counter(
            &registry,
            "proofs_rejected_total",
            "Total number of proofs rejected or presented against a dead session",
        )?;
        let credentials_registered_total = counter(
            &registry,
            "credentials_registered_total",
            "Total number of credentials registered",
        )?;

        // 2048-bit modexps sit in the low milliseconds.
        let verification_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "verification_latency_seconds",
                "Proof verification latency in seconds",
            )
            .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25]),
        )?;
        registry.register(Box::new(verification_latency_seconds.clone()))?;

        Ok(Self {
            registry,
            challenges_issued_total,
            proofs_accepted_total,
            proofs_rejected_total,
            credentials_registered_total,
            verification_latency_seconds,
        })
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

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
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
