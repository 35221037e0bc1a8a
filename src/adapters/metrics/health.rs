//! Health Check Server - Liveness and Readiness Probes
//!
//! Exposes /live and /ready endpoints via axum 0.7 for container
//! health checks. Readiness requires the gate to be accepting traffic
//! and the credential store to be usable.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use crate::ports::repository::SecretRepository;

/// Shared health state polled by readiness probes.
#[derive(Clone)]
pub struct HealthState {
    /// Cleared at the start of graceful shutdown.
    pub accepting: Arc<AtomicBool>,
    /// Credential storage engine.
    repository: Arc<dyn SecretRepository>,
}

impl HealthState {
    pub fn new(repository: Arc<dyn SecretRepository>) -> Self {
        Self {
            accepting: Arc::new(AtomicBool::new(true)),
            repository,
        }
    }

    /// Stop reporting ready (readiness probe → 503).
    pub fn mark_draining(&self) {
        self.accepting.store(false, Ordering::Relaxed);
    }

    /// Check if the gate is ready to serve traffic.
    pub async fn is_ready(&self) -> bool {
        self.accepting.load(Ordering::Relaxed) && self.repository.is_healthy().await
    }
}

/// Axum-based health check HTTP server.
pub struct HealthServer {
    state: HealthState,
    port: u16,
}

impl HealthServer {
    pub fn new(state: HealthState, port: u16) -> Self {
        Self { state, port }
    }

    /// Probe routes, mountable on any listener.
    pub fn router(state: HealthState) -> Router {
        Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .with_state(state)
    }

    /// Start the health check server.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Self::router(self.state);

        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;

        info!(address = %addr, "Health server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always returns 200 if the process is running.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    async fn readiness(State(state): State<HealthState>) -> impl IntoResponse {
        if state.is_ready().await {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::persistence::InMemorySecretRepository;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_ready_until_draining() {
        let state = HealthState::new(Arc::new(InMemorySecretRepository::new()));
        let app = HealthServer::router(state.clone());

        let resp = app
            .clone()
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        state.mark_draining();
        let resp = app
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
