//! Jurisdiction Port - Geoblock Predicate
//!
//! How a caller's jurisdiction is inferred is edge-infrastructure
//! specific (CDN country headers, IP databases). The gate only needs a
//! yes/no answer, so the policy is injected.

use std::collections::BTreeMap;
use std::net::IpAddr;

/// Transport-level facts about an incoming request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
  /// Request headers, names lower-cased.
  pub headers: BTreeMap<String, String>,
  /// Peer address when known.
  pub remote_addr: Option<IpAddr>,
}

impl RequestContext {
  /// Build a context from header pairs (names are lower-cased).
  pub fn from_headers<I, K, V>(headers: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
  {
    Self {
      headers: headers
        .into_iter()
        .map(|(k, v)| (k.as_ref().to_ascii_lowercase(), v.into()))
        .collect(),
      remote_addr: None,
    }
  }

  /// Header value by case-insensitive name.
  pub fn header(&self, name: &str) -> Option<&str> {
    self
      .headers
      .get(&name.to_ascii_lowercase())
      .map(String::as_str)
  }
}

/// Decides whether a request comes from a denied jurisdiction.
pub trait JurisdictionPolicy: Send + Sync + 'static {
  fn is_denied(&self, ctx: &RequestContext) -> bool;
}

impl<F> JurisdictionPolicy for F
where
  F: Fn(&RequestContext) -> bool + Send + Sync + 'static,
{
  fn is_denied(&self, ctx: &RequestContext) -> bool {
    self(ctx)
  }
}
