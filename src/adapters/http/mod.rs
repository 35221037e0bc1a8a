//! HTTP Operation Surface - axum 0.7 Router
//!
//! Routes:
//! - `POST /auth/derive`, `GET /auth/status`, `POST /auth/test`
//! - `GET /readiness?proxy=..`
//! - `POST /orders`, `GET /orders`, `DELETE /orders/:id`
//! - `POST|DELETE /admin/credentials`, `GET /admin/diagnostics`
//!
//! Each request runs inside a span tagged with a fresh request id, echoed
//! back in `x-request-id`.

pub mod error;
pub mod extract;
pub mod geoblock;
pub mod handlers;

use std::sync::Arc;

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{delete, get, post};
use axum::Router;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::adapters::metrics::GateMetrics;
use crate::domain::ids::OwnerKey;
use crate::usecases::{AccessGate, CredentialDerivation, CredentialStore, OrderPipeline, ReadinessService};

pub use geoblock::HeaderCountryPolicy;

/// Shared services behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CredentialStore>,
    pub derivation: Arc<CredentialDerivation>,
    pub readiness: Arc<ReadinessService>,
    pub pipeline: Arc<OrderPipeline>,
    pub gate: Arc<AccessGate>,
    pub metrics: Option<Arc<GateMetrics>>,
    /// Row used by admin operations that name no user.
    pub global_owner: OwnerKey,
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";

async fn request_span(request: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    let span = info_span!(
        "request",
        request_id = %id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/derive", post(handlers::derive_credentials))
        .route("/auth/status", get(handlers::credential_status))
        .route("/auth/test", post(handlers::test_auth))
        .route("/readiness", get(handlers::readiness))
        .route("/orders", post(handlers::submit_order).get(handlers::list_orders))
        .route("/orders/:order_id", delete(handlers::cancel_order))
        .route(
            "/admin/credentials",
            post(handlers::import_credentials).delete(handlers::revoke_credentials),
        )
        .route("/admin/diagnostics", get(handlers::diagnostics))
        .layer(middleware::from_fn(request_span))
        .with_state(state)
}
