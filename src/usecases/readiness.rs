//! Readiness Service - Explicit Refresh of the Onboarding Steps
//!
//! Each refresh re-reads all three facts from their own source (proxy
//! code, token approvals, credential presence) and reduces them with the
//! pure `ReadinessState::current_step`. No state is kept between calls.
//! Each chain read is bounded by the probe timeout; an elapsed read is
//! reported like any other chain failure.
//! `wait_until` is a caller-driven poll loop that stops as soon as the
//! awaited step is reached or the caller cancels.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::domain::error::{truncate_body, GateError};
use crate::domain::ids::{OwnerKey, WalletAddress};
use crate::domain::readiness::{ReadinessState, ReadinessStep};
use crate::ports::chain::WalletStatusProbe;

use super::credential_store::CredentialStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
  pub step: ReadinessStep,
  /// `step == ready`, spelled out for clients.
  pub ready: bool,
  #[serde(flatten)]
  pub state: ReadinessState,
}

fn chain_error(err: anyhow::Error) -> GateError {
  GateError::UpstreamRejected {
    status: None,
    body: truncate_body(&format!("chain probe failed: {err:#}")),
  }
}

/// Default upper bound on a single chain read.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

async fn bounded<T>(
  limit: Duration,
  check: &'static str,
  read: impl Future<Output = anyhow::Result<T>>,
) -> anyhow::Result<T> {
  match tokio::time::timeout(limit, read).await {
    Ok(result) => result,
    Err(_) => Err(anyhow::anyhow!("{check} timed out after {limit:?}")),
  }
}

pub struct ReadinessService {
  probe: Arc<dyn WalletStatusProbe>,
  store: Arc<CredentialStore>,
  poll_interval: Duration,
  probe_timeout: Duration,
}

impl ReadinessService {
  pub fn new(probe: Arc<dyn WalletStatusProbe>, store: Arc<CredentialStore>, poll_interval: Duration) -> Self {
    Self {
      probe,
      store,
      poll_interval,
      probe_timeout: DEFAULT_PROBE_TIMEOUT,
    }
  }

  /// Bound every chain read by `limit`.
  pub fn with_probe_timeout(mut self, limit: Duration) -> Self {
    self.probe_timeout = limit;
    self
  }

  /// Re-derive all three checks and return the current step.
  #[instrument(skip(self), fields(owner = %owner, proxy = %proxy))]
  pub async fn refresh(&self, owner: &OwnerKey, proxy: &WalletAddress) -> Result<ReadinessReport, GateError> {
    let (deployed, approved, presence) = tokio::join!(
      bounded(self.probe_timeout, "proxy deployment check", self.probe.is_proxy_deployed(proxy)),
      bounded(self.probe_timeout, "token approval check", self.probe.tokens_approved(proxy)),
      self.store.has_creds(owner),
    );

    let state = ReadinessState::new(
      deployed.map_err(chain_error)?,
      approved.map_err(chain_error)?,
      presence?.present,
    );
    let step = state.current_step();

    debug!(step = %step, "Readiness refreshed");
    Ok(ReadinessReport {
      step,
      ready: state.is_ready(),
      state,
    })
  }

  /// Poll until the current step is at or past `target`.
  ///
  /// Returns `Ok(None)` when `cancel` flips to `true` or its sender is
  /// dropped. Refresh errors end the loop.
  #[instrument(skip(self, cancel), fields(owner = %owner, proxy = %proxy, target = %target))]
  pub async fn wait_until(
    &self,
    owner: &OwnerKey,
    proxy: &WalletAddress,
    target: ReadinessStep,
    mut cancel: watch::Receiver<bool>,
  ) -> Result<Option<ReadinessReport>, GateError> {
    loop {
      if *cancel.borrow() {
        return Ok(None);
      }

      let report = self.refresh(owner, proxy).await?;
      if report.step >= target {
        return Ok(Some(report));
      }

      tokio::select! {
        _ = tokio::time::sleep(self.poll_interval) => {}
        changed = cancel.changed() => {
          if changed.is_err() {
            warn!("Readiness wait abandoned by caller");
            return Ok(None);
          }
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use async_trait::async_trait;

  use crate::adapters::persistence::InMemorySecretRepository;
  use crate::domain::ids::UserId;

  /// Proxy appears deployed after `deploy_after` probes; never approved.
  struct SlowDeploy {
    calls: AtomicUsize,
    deploy_after: usize,
  }

  #[async_trait]
  impl WalletStatusProbe for SlowDeploy {
    async fn is_proxy_deployed(&self, _proxy: &WalletAddress) -> anyhow::Result<bool> {
      Ok(self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.deploy_after)
    }

    async fn tokens_approved(&self, _proxy: &WalletAddress) -> anyhow::Result<bool> {
      Ok(false)
    }

    async fn is_healthy(&self) -> bool {
      true
    }
  }

  fn service(deploy_after: usize) -> ReadinessService {
    let store = Arc::new(CredentialStore::new(Arc::new(InMemorySecretRepository::new()), Some("k")));
    ReadinessService::new(
      Arc::new(SlowDeploy {
        calls: AtomicUsize::new(0),
        deploy_after,
      }),
      store,
      Duration::from_millis(10),
    )
  }

  /// Chain reads that never resolve, as with a stalled RPC endpoint.
  struct Stalled;

  #[async_trait]
  impl WalletStatusProbe for Stalled {
    async fn is_proxy_deployed(&self, _proxy: &WalletAddress) -> anyhow::Result<bool> {
      std::future::pending().await
    }

    async fn tokens_approved(&self, _proxy: &WalletAddress) -> anyhow::Result<bool> {
      std::future::pending().await
    }

    async fn is_healthy(&self) -> bool {
      false
    }
  }

  fn ids() -> (OwnerKey, WalletAddress) {
    (
      OwnerKey::user(UserId::new("bob").unwrap()),
      WalletAddress::parse("0x00000000000000000000000000000000000000cd").unwrap(),
    )
  }

  #[tokio::test]
  async fn test_refresh_reports_earliest_unmet_step() {
    let (owner, proxy) = ids();
    let report = service(1).refresh(&owner, &proxy).await.unwrap();
    assert_eq!(report.step, ReadinessStep::Usdc);
    assert!(report.state.proxy_deployed);
    assert!(!report.state.credentials_present);
    assert!(!report.ready);
  }

  #[tokio::test]
  async fn test_stalled_chain_read_is_bounded() {
    let (owner, proxy) = ids();
    let store = Arc::new(CredentialStore::new(Arc::new(InMemorySecretRepository::new()), Some("k")));
    let svc = ReadinessService::new(Arc::new(Stalled), store, Duration::from_millis(10))
      .with_probe_timeout(Duration::from_millis(50));

    let outcome = tokio::time::timeout(Duration::from_secs(2), svc.refresh(&owner, &proxy))
      .await
      .expect("refresh must not hang");
    match outcome {
      Err(GateError::UpstreamRejected { status, body }) => {
        assert_eq!(status, None);
        assert!(body.contains("timed out"));
      }
      other => panic!("unexpected outcome: {other:?}"),
    }
  }

  #[tokio::test]
  async fn test_wait_until_stops_once_step_passed() {
    let (owner, proxy) = ids();
    let (_tx, rx) = watch::channel(false);
    let report = service(3)
      .wait_until(&owner, &proxy, ReadinessStep::Usdc, rx)
      .await
      .unwrap()
      .unwrap();
    assert_eq!(report.step, ReadinessStep::Usdc);
  }

  #[tokio::test]
  async fn test_wait_until_honours_cancel() {
    let (owner, proxy) = ids();
    let (tx, rx) = watch::channel(false);
    let svc = service(usize::MAX);

    let handle = tokio::spawn(async move { svc.wait_until(&owner, &proxy, ReadinessStep::Ready, rx).await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    tx.send(true).unwrap();

    let outcome = handle.await.unwrap().unwrap();
    assert!(outcome.is_none());
  }
}
