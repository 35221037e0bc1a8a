//! Polymarket CLOB Gate — Entry Point
//!
//! Wiring sequence:
//! 1. Load config.toml + validate, read secrets from env once
//! 2. Init tracing (JSON structured logging)
//! 3. Open the credential repository (memory or JSON files)
//! 4. Create the CLOB transport (timeout + semaphore + rate limit)
//! 5. Connect to Polygon RPC for the wallet status probe
//! 6. Build the use cases and the axum router
//! 7. Spawn health (/live, /ready) and metrics (/metrics) servers
//! 8. Serve until SIGINT, then drain and exit

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use polymarket_clob_gate::adapters::api::client::{ClobClient, ClobClientConfig};
use polymarket_clob_gate::adapters::chain::{ChainWalletProbe, ContractAddresses, PolygonProvider};
use polymarket_clob_gate::adapters::http::{self, AppState, HeaderCountryPolicy};
use polymarket_clob_gate::adapters::metrics::{GateMetrics, HealthServer, HealthState};
use polymarket_clob_gate::adapters::persistence::{InMemorySecretRepository, JsonFileSecretRepository};
use polymarket_clob_gate::config::{self, AppConfig, Secrets, StorageBackend, ADMIN_TOKEN_ENV, MASTER_KEY_ENV};
use polymarket_clob_gate::domain::ids::OwnerKey;
use polymarket_clob_gate::ports::exchange::ExchangeTransport;
use polymarket_clob_gate::ports::repository::SecretRepository;
use polymarket_clob_gate::usecases::{
    AccessGate, CredentialDerivation, CredentialStore, OrderPipeline, ReadinessService,
};

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Configuration and secrets ────────────────────────
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = config::loader::load_config(&config_path)
        .context("Failed to load configuration")?;
    let secrets = Secrets::from_env();

    // ── 2. Structured JSON logging ──────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.service.environment,
        "Starting Polymarket CLOB gate"
    );
    if secrets.master_key.is_none() {
        warn!(env = MASTER_KEY_ENV, "Master key not set, credential operations will fail");
    }
    if secrets.admin_token.is_none() {
        warn!(env = ADMIN_TOKEN_ENV, "Admin token not set");
    }

    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 3. Credential repository ────────────────────────────
    let repository: Arc<dyn SecretRepository> = match config.persistence.backend {
        StorageBackend::Memory => {
            warn!("In-memory credential storage, credentials are lost on restart");
            Arc::new(InMemorySecretRepository::new())
        }
        StorageBackend::File => Arc::new(
            JsonFileSecretRepository::open(&config.persistence.data_dir)
                .await
                .context("Failed to open credential store")?,
        ),
    };

    let metrics = if config.metrics.enabled {
        Some(Arc::new(GateMetrics::new().context("Failed to register metrics")?))
    } else {
        None
    };

    // ── 4. CLOB transport ───────────────────────────────────
    let mut client = ClobClient::new(ClobClientConfig {
        base_url: config.api.clob_url.clone(),
        timeout: Duration::from_millis(config.api.timeout_ms),
        max_concurrent: config.api.max_concurrent,
        requests_per_second: config.api.requests_per_second,
    })
    .context("Failed to create CLOB client")?;
    if let Some(m) = &metrics {
        client = client.with_metrics(Arc::clone(m));
    }
    let transport: Arc<dyn ExchangeTransport> = Arc::new(client);

    // ── 5. Polygon wallet status probe ──────────────────────
    let provider = Arc::new(
        PolygonProvider::connect(&config.api)
            .await
            .context("Failed to connect to Polygon RPC")?,
    );
    let addresses = ContractAddresses::from_config(&config.contracts)?;
    let probe = Arc::new(ChainWalletProbe::new(provider, addresses));

    // ── 6. Use cases and router ─────────────────────────────
    let state = build_state(&config, &secrets, Arc::clone(&repository), transport, probe, metrics.clone());
    let app = http::router(state);

    // ── 7. Health and metrics servers ───────────────────────
    let health = HealthState::new(Arc::clone(&repository));
    let health_server = HealthServer::new(health.clone(), config.service.health_port);
    let health_handle = tokio::spawn({
        let rx = shutdown_tx.subscribe();
        async move {
            if let Err(e) = health_server.run(rx).await {
                error!(error = %e, "Health server failed");
            }
        }
    });

    let metrics_handle = metrics.map(|m| {
        let rx = shutdown_tx.subscribe();
        let bind = config.metrics.bind_address.clone();
        tokio::spawn(async move {
            if let Err(e) = m.serve(bind, rx).await {
                error!(error = %e, "Metrics server failed");
            }
        })
    });

    // ── 8. Operation surface ────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.service.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.service.bind_address))?;
    info!(address = %config.service.bind_address, "Gate listening");

    let drain = {
        let health = health.clone();
        let shutdown_tx = shutdown_tx.clone();
        async move {
            if let Err(e) = signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for SIGINT");
            }
            info!("SIGINT received, initiating graceful shutdown");
            health.mark_draining();
            let _ = shutdown_tx.send(());
        }
    };

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(drain)
        .await
        .context("Gate server failed")?;

    let _ = tokio::time::timeout(Duration::from_secs(5), health_handle).await;
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}

/// Construct every use case from config, secrets and adapters.
fn build_state(
    config: &AppConfig,
    secrets: &Secrets,
    repository: Arc<dyn SecretRepository>,
    transport: Arc<dyn ExchangeTransport>,
    probe: Arc<ChainWalletProbe>,
    metrics: Option<Arc<GateMetrics>>,
) -> AppState {
    let store = Arc::new(CredentialStore::new(repository, secrets.master_key.as_deref()));
    let gate = Arc::new(AccessGate::new(
        secrets.admin_token.clone(),
        config.service.environment,
        Arc::new(HeaderCountryPolicy::from_config(&config.geoblock)),
    ));

    AppState {
        derivation: Arc::new(CredentialDerivation::new(Arc::clone(&transport), Arc::clone(&store))),
        readiness: Arc::new(ReadinessService::new(
            probe,
            Arc::clone(&store),
            Duration::from_millis(config.readiness.poll_interval_ms),
        )
        .with_probe_timeout(Duration::from_millis(config.api.timeout_ms))),
        pipeline: Arc::new(OrderPipeline::new(Arc::clone(&gate), Arc::clone(&store), transport)),
        gate,
        store,
        metrics,
        global_owner: OwnerKey::global(config.credentials.global_name.clone()),
    }
}
