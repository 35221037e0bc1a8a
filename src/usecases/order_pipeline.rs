//! Order Pipeline - Authenticated Trading Calls
//!
//! Every trading call follows the same shape:
//! - load and decrypt the owner's credential (placeholders refused)
//! - sign with L2 headers (URL-safe HMAC) and send to the CLOB
//! - classify: 2xx passes the upstream body through, a 401 naming the
//!   key as invalid purges the stored credential, anything else is a
//!   rejection that leaves the credential alone
//!
//! Order submission additionally runs the jurisdiction check before the
//! credential is touched, and binds the order to the credential: `owner`
//! is forced to the API key and the order signer must be the wallet the
//! key was derived for.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

use crate::adapters::api::auth::{unix_timestamp, L2Headers, SignatureEncoding};
use crate::adapters::api::types::{CancelOrderRequest, OPEN_ORDERS_PATH, ORDER_PATH};
use crate::domain::credential::BoundCredential;
use crate::domain::error::{truncate_body, GateError};
use crate::domain::ids::OwnerKey;
use crate::domain::order::{ClientOrderRequest, OrderEnvelope};
use crate::ports::exchange::{ExchangeRequest, ExchangeTransport, HttpMethod};
use crate::ports::jurisdiction::RequestContext;

use super::access_gate::AccessGate;
use super::credential_store::CredentialStore;

/// Lower-cased body fragments by which the CLOB reports a dead key.
const INVALID_KEY_PATTERNS: [&str; 3] = ["invalid api key", "unauthorized", "invalid_api_key"];

/// Whether an upstream response says the API key itself is invalid.
pub fn is_invalid_key_response(status: u16, body: &str) -> bool {
  if status != 401 {
    return false;
  }
  let body = body.to_ascii_lowercase();
  INVALID_KEY_PATTERNS.iter().any(|p| body.contains(p))
}

/// Last upstream failure seen for an owner, for the diagnostics surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamFailure {
  pub operation: &'static str,
  pub status: Option<u16>,
  pub body: String,
  pub purged: bool,
  pub at: DateTime<Utc>,
}

pub struct OrderPipeline {
  gate: Arc<AccessGate>,
  store: Arc<CredentialStore>,
  transport: Arc<dyn ExchangeTransport>,
  /// One entry per owner, overwritten on each failure.
  last_failures: RwLock<HashMap<OwnerKey, UpstreamFailure>>,
}

impl OrderPipeline {
  pub fn new(gate: Arc<AccessGate>, store: Arc<CredentialStore>, transport: Arc<dyn ExchangeTransport>) -> Self {
    Self {
      gate,
      store,
      transport,
      last_failures: RwLock::new(HashMap::new()),
    }
  }

  /// Submit a client-signed order. Returns the upstream order object verbatim.
  #[instrument(skip(self, ctx, request), fields(owner = %owner, order_type = ?request.order_type))]
  pub async fn submit(
    &self,
    ctx: &RequestContext,
    owner: &OwnerKey,
    request: ClientOrderRequest,
  ) -> Result<Value, GateError> {
    self.gate.check_jurisdiction(ctx)?;

    let credential = self.authenticate(owner).await?;
    let api_key = credential.api_key();

    if let Some(claimed) = request.owner.as_deref() {
      if claimed != api_key.as_str() {
        warn!("Order owner does not match the active API key");
        return Err(GateError::SignerMismatch {
          expected: api_key.to_string(),
          actual: claimed.to_string(),
        });
      }
    }

    let address = credential.signing_address()?;
    if request.order.signer != *address {
      warn!(signer = %request.order.signer, expected = %address, "Order signer mismatch");
      return Err(GateError::SignerMismatch {
        expected: address.to_string(),
        actual: request.order.signer.to_string(),
      });
    }

    let envelope = OrderEnvelope::new(request.order, api_key, request.order_type);
    let body = serde_json::to_string(&envelope)
      .map_err(|e| GateError::Validation(format!("order could not be encoded: {e}")))?;

    let result = self
      .send(owner, "submit", &credential, HttpMethod::Post, ORDER_PATH, Some(body))
      .await?;
    info!("Order accepted by exchange");
    Ok(result)
  }

  /// Cancel one order by exchange order id.
  #[instrument(skip(self), fields(owner = %owner))]
  pub async fn cancel(&self, owner: &OwnerKey, order_id: &str) -> Result<Value, GateError> {
    let order_id = order_id.trim();
    if order_id.is_empty() {
      return Err(GateError::Validation("order id must not be empty".to_string()));
    }

    let credential = self.authenticate(owner).await?;
    let body = serde_json::to_string(&CancelOrderRequest {
      order_id: order_id.to_string(),
    })
    .map_err(|e| GateError::Validation(e.to_string()))?;

    self
      .send(owner, "cancel", &credential, HttpMethod::Delete, ORDER_PATH, Some(body))
      .await
  }

  /// List the owner's open orders.
  #[instrument(skip(self), fields(owner = %owner))]
  pub async fn open_orders(&self, owner: &OwnerKey) -> Result<Value, GateError> {
    let credential = self.authenticate(owner).await?;
    self
      .send(owner, "list", &credential, HttpMethod::Get, OPEN_ORDERS_PATH, None)
      .await
  }

  /// Most recent upstream failure for an owner, if any.
  pub async fn last_failure(&self, owner: &OwnerKey) -> Option<UpstreamFailure> {
    self.last_failures.read().await.get(owner).cloned()
  }

  async fn authenticate(&self, owner: &OwnerKey) -> Result<BoundCredential, GateError> {
    self.store.get(owner).await?.into_signing()
  }

  async fn send(
    &self,
    owner: &OwnerKey,
    operation: &'static str,
    credential: &BoundCredential,
    method: HttpMethod,
    path: &str,
    body: Option<String>,
  ) -> Result<Value, GateError> {
    let timestamp = unix_timestamp();
    let headers = L2Headers::build(
      credential,
      &timestamp,
      method,
      path,
      body.as_deref().unwrap_or(""),
      SignatureEncoding::UrlSafe,
    )?
    .into_pairs();

    let request = ExchangeRequest {
      method,
      path: path.to_string(),
      headers,
      body,
    };

    let response = match self.transport.execute(request).await {
      Ok(response) => response,
      Err(e) => {
        let body = truncate_body(&e.to_string());
        self.remember(owner, operation, None, &body, false).await;
        return Err(GateError::UpstreamRejected { status: None, body });
      }
    };

    if response.is_success() {
      return Ok(serde_json::from_str(&response.body).unwrap_or(Value::String(response.body)));
    }

    let body = truncate_body(&response.body);

    if is_invalid_key_response(response.status, &response.body) {
      self.remember(owner, operation, Some(response.status), &body, true).await;
      self.purge(owner, response.status, &body).await?;
      return Err(GateError::InvalidCredential { body });
    }

    warn!(
      operation,
      status = response.status,
      body = %body,
      "Exchange rejected request"
    );
    self.remember(owner, operation, Some(response.status), &body, false).await;
    Err(GateError::UpstreamRejected {
      status: Some(response.status),
      body,
    })
  }

  async fn purge(&self, owner: &OwnerKey, status: u16, body: &str) -> Result<(), GateError> {
    match self.store.delete(owner).await {
      Ok(existed) => {
        warn!(
          owner = %owner,
          reason = "invalid_api_key",
          status,
          body = %body,
          existed,
          "Credential purged after exchange rejected the API key"
        );
        Ok(())
      }
      Err(e) => {
        error!(owner = %owner, error = %e, "Failed to purge rejected credential");
        Err(e)
      }
    }
  }

  async fn remember(&self, owner: &OwnerKey, operation: &'static str, status: Option<u16>, body: &str, purged: bool) {
    self.last_failures.write().await.insert(
      owner.clone(),
      UpstreamFailure {
        operation,
        status,
        body: body.to_string(),
        purged,
        at: Utc::now(),
      },
    );
  }
}
