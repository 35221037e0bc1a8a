//! Trading readiness steps.
//!
//! The current step is a pure function of three independently observed
//! facts. Nothing here is stored; callers re-observe and recompute.

use serde::{Deserialize, Serialize};

/// Next action a user must take before an order can be submitted.
///
/// Declaration order is the fixed step order, so `Ord` compares progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStep {
    /// Deploy the proxy (Safe) wallet.
    Proxy,
    /// Approve USDC and outcome tokens for the exchange contracts.
    Usdc,
    /// Derive L2 API credentials.
    Creds,
    /// Orders may be submitted.
    Ready,
}

impl ReadinessStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Usdc => "usdc",
            Self::Creds => "creds",
            Self::Ready => "ready",
        }
    }
}

impl std::fmt::Display for ReadinessStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessState {
    pub proxy_deployed: bool,
    pub tokens_approved: bool,
    pub credentials_present: bool,
}

impl ReadinessState {
    pub fn new(proxy_deployed: bool, tokens_approved: bool, credentials_present: bool) -> Self {
        Self {
            proxy_deployed,
            tokens_approved,
            credentials_present,
        }
    }

    /// Earliest unmet step in `proxy, usdc, creds`; `Ready` when all hold.
    pub fn current_step(&self) -> ReadinessStep {
        if !self.proxy_deployed {
            ReadinessStep::Proxy
        } else if !self.tokens_approved {
            ReadinessStep::Usdc
        } else if !self.credentials_present {
            ReadinessStep::Creds
        } else {
            ReadinessStep::Ready
        }
    }

    pub fn is_ready(&self) -> bool {
        self.current_step() == ReadinessStep::Ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_eight_combinations() {
        let cases = [
            ((false, false, false), ReadinessStep::Proxy),
            ((false, false, true), ReadinessStep::Proxy),
            ((false, true, false), ReadinessStep::Proxy),
            ((false, true, true), ReadinessStep::Proxy),
            ((true, false, false), ReadinessStep::Usdc),
            ((true, false, true), ReadinessStep::Usdc),
            ((true, true, false), ReadinessStep::Creds),
            ((true, true, true), ReadinessStep::Ready),
        ];
        for ((p, t, c), expected) in cases {
            assert_eq!(ReadinessState::new(p, t, c).current_step(), expected, "{p} {t} {c}");
        }
    }

    #[test]
    fn test_step_order() {
        assert!(ReadinessStep::Proxy < ReadinessStep::Usdc);
        assert!(ReadinessStep::Usdc < ReadinessStep::Creds);
        assert!(ReadinessStep::Creds < ReadinessStep::Ready);
    }

    #[test]
    fn test_step_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ReadinessStep::Usdc).unwrap(), "\"usdc\"");
    }
}
