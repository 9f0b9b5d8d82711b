//! # Prometheus Metrics
//!
//! Exposes operational metrics for the desk node. Scraped by Prometheus
//! at the `/metrics` HTTP endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct DeskMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of settled token transfers.
    pub transfers_total: IntCounter,
    /// Total number of settled purchases, both currencies.
    pub purchases_total: IntCounter,
    /// Total number of settled treasury withdrawals.
    pub withdrawals_total: IntCounter,
    /// Total number of operations rejected by validation.
    pub operations_rejected_total: IntCounter,
    /// Current total token supply.
    pub token_supply: IntGauge,
    /// Current native treasury holdings.
    pub treasury_native_held: IntGauge,
    /// Current wrapped treasury holdings.
    pub treasury_wrapped_held: IntGauge,
    /// Histogram of request handling latency in seconds.
    pub request_latency_seconds: Histogram,
}

impl DeskMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("mintdesk".into()), None)
            .expect("failed to create prometheus registry");

        let transfers_total =
            IntCounter::new("transfers_total", "Total number of settled token transfers")
                .expect("metric creation");
        registry
            .register(Box::new(transfers_total.clone()))
            .expect("metric registration");

        let purchases_total = IntCounter::new(
            "purchases_total",
            "Total number of settled purchases across both currencies",
        )
        .expect("metric creation");
        registry
            .register(Box::new(purchases_total.clone()))
            .expect("metric registration");

        let withdrawals_total = IntCounter::new(
            "withdrawals_total",
            "Total number of settled treasury withdrawals",
        )
        .expect("metric creation");
        registry
            .register(Box::new(withdrawals_total.clone()))
            .expect("metric registration");

        let operations_rejected_total = IntCounter::new(
            "operations_rejected_total",
            "Total number of operations rejected by validation",
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_rejected_total.clone()))
            .expect("metric registration");

        let token_supply = IntGauge::new("token_supply", "Current total token supply")
            .expect("metric creation");
        registry
            .register(Box::new(token_supply.clone()))
            .expect("metric registration");

        let treasury_native_held = IntGauge::new(
            "treasury_native_held",
            "Current native treasury holdings",
        )
        .expect("metric creation");
        registry
            .register(Box::new(treasury_native_held.clone()))
            .expect("metric registration");

        let treasury_wrapped_held = IntGauge::new(
            "treasury_wrapped_held",
            "Current wrapped treasury holdings",
        )
        .expect("metric creation");
        registry
            .register(Box::new(treasury_wrapped_held.clone()))
            .expect("metric registration");

        let request_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_latency_seconds",
                "End-to-end request handling latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(request_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            transfers_total,
            purchases_total,
            withdrawals_total,
            operations_rejected_total,
            token_supply,
            treasury_native_held,
            treasury_wrapped_held,
            request_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for DeskMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers via extension.
pub type SharedMetrics = Arc<DeskMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
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
