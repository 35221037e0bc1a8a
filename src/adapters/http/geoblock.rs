//! Country-header jurisdiction policy.
//!
//! Reads an ISO 3166 alpha-2 code set by the edge (Cloudflare's
//! `cf-ipcountry` by default) and denies configured codes. A request
//! without the header is allowed.

use std::collections::HashSet;

use crate::config::GeoblockConfig;
use crate::ports::jurisdiction::{JurisdictionPolicy, RequestContext};

#[derive(Debug, Clone)]
pub struct HeaderCountryPolicy {
    header: String,
    denied: HashSet<String>,
}

impl HeaderCountryPolicy {
    pub fn new<I, S>(header: &str, denied: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            header: header.to_ascii_lowercase(),
            denied: denied
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn from_config(config: &GeoblockConfig) -> Self {
        Self::new(&config.country_header, &config.denied)
    }
}

impl JurisdictionPolicy for HeaderCountryPolicy {
    fn is_denied(&self, ctx: &RequestContext) -> bool {
        ctx.header(&self.header)
            .map(|country| self.denied.contains(&country.trim().to_ascii_uppercase()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_country_case_insensitive() {
        let policy = HeaderCountryPolicy::new("CF-IPCountry", ["us", "CU"]);
        assert!(policy.is_denied(&RequestContext::from_headers([("cf-ipcountry", "US")])));
        assert!(policy.is_denied(&RequestContext::from_headers([("CF-IPCOUNTRY", "cu")])));
        assert!(!policy.is_denied(&RequestContext::from_headers([("cf-ipcountry", "DE")])));
    }

    #[test]
    fn test_missing_header_is_allowed() {
        let policy = HeaderCountryPolicy::new("cf-ipcountry", ["US"]);
        assert!(!policy.is_denied(&RequestContext::default()));
    }
}
