//! Access Gate - Admin Token and Jurisdiction Checks
//!
//! Admin tokens are compared in constant time. With no token configured
//! the gate refuses admin operations, except in `development` where it
//! allows them and says so in the log.

use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::warn;

use crate::config::{Environment, ADMIN_TOKEN_ENV};
use crate::domain::error::GateError;
use crate::ports::jurisdiction::{JurisdictionPolicy, RequestContext};

pub struct AccessGate {
  admin_token: Option<String>,
  environment: Environment,
  jurisdiction: Arc<dyn JurisdictionPolicy>,
}

impl AccessGate {
  pub fn new(
    admin_token: Option<String>,
    environment: Environment,
    jurisdiction: Arc<dyn JurisdictionPolicy>,
  ) -> Self {
    Self {
      admin_token,
      environment,
      jurisdiction,
    }
  }

  /// Authorize an admin-gated operation.
  pub fn check_admin(&self, supplied: Option<&str>) -> Result<(), GateError> {
    let Some(expected) = self.admin_token.as_deref() else {
      return match self.environment {
        Environment::Development => {
          warn!("No admin token configured, allowing admin operation (development)");
          Ok(())
        }
        Environment::Production => Err(GateError::Config(format!("{ADMIN_TOKEN_ENV} is not set"))),
      };
    };

    let supplied = supplied.ok_or_else(|| GateError::Auth("missing admin token".to_string()))?;
    if bool::from(supplied.as_bytes().ct_eq(expected.as_bytes())) {
      Ok(())
    } else {
      warn!("Admin token mismatch");
      Err(GateError::Auth("invalid admin token".to_string()))
    }
  }

  /// Reject requests from denied jurisdictions.
  pub fn check_jurisdiction(&self, ctx: &RequestContext) -> Result<(), GateError> {
    if self.jurisdiction.is_denied(ctx) {
      warn!(remote = ?ctx.remote_addr, "Request geoblocked");
      return Err(GateError::Geoblocked);
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn allow_all() -> Arc<dyn JurisdictionPolicy> {
    Arc::new(|_: &RequestContext| false)
  }

  #[test]
  fn test_admin_token_must_match() {
    let gate = AccessGate::new(Some("s3cret".to_string()), Environment::Production, allow_all());
    assert!(gate.check_admin(Some("s3cret")).is_ok());
    assert_eq!(gate.check_admin(Some("s3cre")).unwrap_err().code(), "UNAUTHORIZED");
    assert_eq!(gate.check_admin(None).unwrap_err().code(), "UNAUTHORIZED");
  }

  #[test]
  fn test_unset_token_depends_on_environment() {
    let prod = AccessGate::new(None, Environment::Production, allow_all());
    assert_eq!(prod.check_admin(Some("anything")).unwrap_err().code(), "CONFIG_ERROR");

    let dev = AccessGate::new(None, Environment::Development, allow_all());
    assert!(dev.check_admin(None).is_ok());
  }

  #[test]
  fn test_jurisdiction_predicate_is_injected() {
    let gate = AccessGate::new(
      None,
      Environment::Production,
      Arc::new(|ctx: &RequestContext| ctx.header("x-country") == Some("XX")),
    );
    let denied = RequestContext::from_headers([("X-Country", "XX")]);
    let allowed = RequestContext::from_headers([("X-Country", "FR")]);
    assert!(matches!(gate.check_jurisdiction(&denied), Err(GateError::Geoblocked)));
    assert!(gate.check_jurisdiction(&allowed).is_ok());
  }
}
