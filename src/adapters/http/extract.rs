//! Axum extractors for the caller's identity and request context.
//!
//! Session authentication happens upstream of this service; the
//! authenticated user id arrives in `x-session-user`.

use std::net::SocketAddr;

use axum::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use axum::Json;

use crate::domain::error::GateError;
use crate::domain::ids::UserId;
use crate::ports::jurisdiction::RequestContext;

pub const SESSION_USER_HEADER: &str = "x-session-user";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Authenticated session identity. Missing or empty → 401.
#[derive(Debug, Clone)]
pub struct SessionUser(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| GateError::Auth("missing session".to_string()))?;
        Ok(Self(UserId::new(raw)?))
    }
}

/// Admin token as supplied by the caller, if any.
#[derive(Debug, Clone)]
pub struct AdminToken(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for AdminToken
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .headers
                .get(ADMIN_TOKEN_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
        ))
    }
}

/// Headers and peer address for the jurisdiction policy.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = GateError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let mut ctx = RequestContext::from_headers(
            parts
                .headers
                .iter()
                .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?))),
        );
        ctx.remote_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(ctx))
    }
}

/// Turn a JSON body rejection into the gate's validation error.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, GateError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| GateError::Validation(e.body_text()))
}
