//! Route handlers for the operation surface.
//!
//! Handlers only translate between HTTP and the use cases; every rule
//! lives in `crate::usecases`. Successful responses carry `"ok": true`.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::credential::CredentialTriple;
use crate::domain::error::GateError;
use crate::domain::ids::{OwnerKey, UserId, WalletAddress};
use crate::domain::order::ClientOrderRequest;
use crate::usecases::derivation::L1Proof;

use super::extract::{json_body, AdminToken, Caller, SessionUser};
use super::AppState;

type ApiResult = Result<Json<Value>, GateError>;

fn ok(mut body: Value) -> Json<Value> {
    if let Value::Object(map) = &mut body {
        map.insert("ok".to_string(), Value::Bool(true));
    }
    Json(body)
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, GateError> {
    serde_json::to_value(value).map_err(|e| GateError::Storage(format!("response encoding failed: {e}")))
}

// ── Credentials ──────────────────────────────────────────────

pub async fn derive_credentials(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    payload: Result<Json<L1Proof>, JsonRejection>,
) -> ApiResult {
    let proof = json_body(payload)?;
    let stored = state.derivation.derive(&OwnerKey::user(user), proof).await?;
    if let Some(metrics) = &state.metrics {
        metrics.record_stored(stored.source.as_str());
    }
    Ok(ok(to_value(&stored)?))
}

pub async fn credential_status(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> ApiResult {
    let presence = state.store.has_creds(&OwnerKey::user(user)).await?;
    Ok(ok(to_value(&presence)?))
}

pub async fn test_auth(
    State(state): State<AppState>,
    SessionUser(_user): SessionUser,
    payload: Result<Json<L1Proof>, JsonRejection>,
) -> ApiResult {
    let proof = json_body(payload)?;
    let probe = state.derivation.probe(&proof).await?;
    // `ok` is the exchange's verdict on the signature
    Ok(Json(json!({ "ok": probe.ok, "status": probe.status })))
}

// ── Readiness ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReadinessQuery {
    address: Option<String>,
    proxy: Option<String>,
}

pub async fn readiness(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Query(query): Query<ReadinessQuery>,
) -> ApiResult {
    let raw = query
        .proxy
        .or(query.address)
        .ok_or_else(|| GateError::Validation("proxy address is required".to_string()))?;
    let proxy = WalletAddress::parse(&raw)?;

    let report = state.readiness.refresh(&OwnerKey::user(user), &proxy).await?;
    Ok(ok(to_value(&report)?))
}

// ── Orders ───────────────────────────────────────────────────

pub async fn submit_order(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Caller(ctx): Caller,
    payload: Result<Json<ClientOrderRequest>, JsonRejection>,
) -> ApiResult {
    let request = json_body(payload)?;
    let result = state
        .pipeline
        .submit(&ctx, &OwnerKey::user(user), request)
        .await;
    if let Some(metrics) = &state.metrics {
        metrics.record_trading_outcome("submit", &result);
    }
    let order = result?;
    Ok(ok(json!({ "order": order })))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
    Path(order_id): Path<String>,
) -> ApiResult {
    let result = state.pipeline.cancel(&OwnerKey::user(user), &order_id).await;
    if let Some(metrics) = &state.metrics {
        metrics.record_trading_outcome("cancel", &result);
    }
    let cancelled = result?;
    Ok(ok(json!({ "result": cancelled })))
}

pub async fn list_orders(
    State(state): State<AppState>,
    SessionUser(user): SessionUser,
) -> ApiResult {
    let result = state.pipeline.open_orders(&OwnerKey::user(user)).await;
    if let Some(metrics) = &state.metrics {
        metrics.record_trading_outcome("list", &result);
    }
    let orders = result?;
    Ok(ok(json!({ "orders": orders })))
}

// ── Admin ────────────────────────────────────────────────────

/// Target row: a user id, or the shared platform credential when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    user_id: Option<String>,
    proxy: Option<String>,
}

fn resolve_owner(state: &AppState, user_id: Option<String>) -> Result<OwnerKey, GateError> {
    match user_id {
        Some(id) => UserId::new(id)
            .map(OwnerKey::user)
            .map_err(|_| GateError::Validation("userId must not be empty".to_string())),
        None => Ok(state.global_owner.clone()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRequest {
    user_id: Option<String>,
    api_key: String,
    secret: String,
    passphrase: String,
    address: Option<WalletAddress>,
    #[serde(default)]
    placeholder: bool,
}

pub async fn import_credentials(
    State(state): State<AppState>,
    AdminToken(token): AdminToken,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult {
    state.gate.check_admin(token.as_deref())?;
    let request = json_body(payload)?;

    let owner = resolve_owner(&state, request.user_id)?;
    let triple = CredentialTriple::from_parts(&request.api_key, &request.secret, &request.passphrase)?;
    let stored = state
        .derivation
        .import(&owner, triple, request.address, request.placeholder)
        .await?;

    if let Some(metrics) = &state.metrics {
        metrics.record_stored(stored.source.as_str());
    }
    Ok(ok(to_value(&stored)?))
}

pub async fn revoke_credentials(
    State(state): State<AppState>,
    AdminToken(token): AdminToken,
    Query(query): Query<OwnerQuery>,
) -> ApiResult {
    state.gate.check_admin(token.as_deref())?;
    let owner = resolve_owner(&state, query.user_id)?;

    let deleted = state.store.delete(&owner).await?;
    tracing::warn!(owner = %owner, reason = "admin_revoke", deleted, "Credential revoked");
    Ok(ok(json!({ "owner": owner.to_string(), "deleted": deleted })))
}

pub async fn diagnostics(
    State(state): State<AppState>,
    AdminToken(token): AdminToken,
    Query(query): Query<OwnerQuery>,
) -> ApiResult {
    state.gate.check_admin(token.as_deref())?;
    let owner = resolve_owner(&state, query.user_id)?;

    let presence = state.store.has_creds(&owner).await?;
    let last_failure = state.pipeline.last_failure(&owner).await;

    let readiness = match (query.proxy.as_deref(), &owner) {
        (Some(raw), OwnerKey::User(_)) => {
            let proxy = WalletAddress::parse(raw)?;
            match state.readiness.refresh(&owner, &proxy).await {
                Ok(report) => to_value(&report)?,
                Err(e) => json!({ "code": e.code(), "error": e.to_string() }),
            }
        }
        _ => Value::Null,
    };

    let credentials = to_value(&presence)?;
    let last_failure = to_value(&last_failure)?;
    Ok(ok(json!({
        "owner": owner.to_string(),
        "credentials": credentials,
        "lastFailure": last_failure,
        "readiness": readiness,
    })))
}
