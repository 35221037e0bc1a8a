//! Prometheus Metrics Registry - Credential Gate Observability
//!
//! Counts credential derivations and purges, order outcomes and
//! geoblock denials, and tracks upstream CLOB latency. Exposed on a
//! separate `/metrics` listener.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};

use crate::domain::error::GateError;

/// Centralized Prometheus metrics for the gate.
///
/// All metrics follow the naming convention `clob_gate_*`.
pub struct GateMetrics {
    registry: Registry,
    /// Credentials stored, by how they were obtained (derive|create|import).
    pub credentials_derived: IntCounterVec,
    /// Credentials deleted after the exchange rejected them.
    pub credentials_purged: IntCounterVec,
    /// Trading calls by operation and outcome (`ok` or error code).
    pub orders: IntCounterVec,
    /// Requests refused by the jurisdiction policy.
    pub geoblocked: IntCounter,
    /// CLOB round-trip latency in milliseconds.
    pub upstream_latency_ms: HistogramVec,
}

impl GateMetrics {
    /// Create and register all Prometheus metrics.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let credentials_derived = IntCounterVec::new(
            Opts::new(
                "clob_gate_credentials_derived_total",
                "Credentials written to the store",
            ),
            &["method"],
        )?;

        let credentials_purged = IntCounterVec::new(
            Opts::new(
                "clob_gate_credentials_purged_total",
                "Credentials deleted after upstream rejection",
            ),
            &["reason"],
        )?;

        let orders = IntCounterVec::new(
            Opts::new("clob_gate_orders_total", "Authenticated trading calls"),
            &["operation", "outcome"],
        )?;

        let geoblocked = IntCounter::new(
            "clob_gate_geoblocked_total",
            "Requests denied by jurisdiction",
        )?;

        let upstream_latency_ms = HistogramVec::new(
            HistogramOpts::new(
                "clob_gate_upstream_latency_ms",
                "CLOB request latency in milliseconds",
            )
            .buckets(vec![10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0]),
            &["endpoint"],
        )?;

        registry.register(Box::new(credentials_derived.clone()))?;
        registry.register(Box::new(credentials_purged.clone()))?;
        registry.register(Box::new(orders.clone()))?;
        registry.register(Box::new(geoblocked.clone()))?;
        registry.register(Box::new(upstream_latency_ms.clone()))?;

        Ok(Self {
            registry,
            credentials_derived,
            credentials_purged,
            orders,
            geoblocked,
            upstream_latency_ms,
        })
    }

    pub fn record_stored(&self, method: &str) {
        self.credentials_derived.with_label_values(&[method]).inc();
    }

    pub fn observe_upstream(&self, endpoint: &str, elapsed: Duration) {
        self.upstream_latency_ms
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64() * 1000.0);
    }

    /// Count one trading call. Purges and geoblocks are derived from the error.
    pub fn record_trading_outcome<T>(&self, operation: &str, result: &Result<T, GateError>) {
        let outcome = match result {
            Ok(_) => "ok",
            Err(e) => e.code(),
        };
        self.orders.with_label_values(&[operation, outcome]).inc();

        match result {
            Err(GateError::InvalidCredential { .. }) => {
                self.credentials_purged
                    .with_label_values(&["invalid_api_key"])
                    .inc();
            }
            Err(GateError::Geoblocked) => self.geoblocked.inc(),
            _ => {}
        }
    }

    /// Text exposition of every registered family.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Serve Prometheus metrics on the configured bind address.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn serve(
        self: Arc<Self>,
        bind_address: String,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> anyhow::Result<()> {
        let metrics = Arc::clone(&self);

        let app = Router::new().route(
            "/metrics",
            get(move || {
                let metrics = Arc::clone(&metrics);
                async move {
                    match metrics.render() {
                        Ok(body) => (StatusCode::OK, body),
                        Err(e) => {
                            warn!(error = %e, "Metrics encoding failed");
                            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
                        }
                    }
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind(&bind_address).await?;
        info!(address = %bind_address, "Prometheus metrics server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}
