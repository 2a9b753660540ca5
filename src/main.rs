//! Shardflow - cross-chain transfer orchestration service
//!
//! Connects to a ledger node, loads the chain tree and token catalog,
//! and serves the transfer API.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info};

use shardflow::config::Settings;
use shardflow::ledger::{ChainTopology, LedgerRpc, NodeClient, TokenCatalog};
use shardflow::metrics::MetricsServer;
use shardflow::orchestrator::{AccountCache, MemorySessionStore, TransferOrchestrator};
use shardflow::{api, orchestrator::SessionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    init_logging();

    info!("Starting Shardflow v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let settings = Settings::load()?;
    info!("Connecting to node at {}", settings.node.rpc_url);

    let rpc: Arc<dyn LedgerRpc> = Arc::new(NodeClient::new(
        &settings.node.rpc_url,
        Duration::from_millis(settings.node.request_timeout_ms),
    )?);

    // Load the chain tree and token catalog up front; both are cached
    // until a transfer completion invalidates account state
    let topology = Arc::new(ChainTopology::new(rpc.clone()));
    topology.load().await?;
    info!("Chain topology loaded: {} chains", topology.snapshot().await.len());

    let tokens = Arc::new(TokenCatalog::new(rpc.clone()));
    tokens.load().await?;
    info!("Token catalog loaded");

    let sessions: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let cache = Arc::new(AccountCache::new());

    let orchestrator = Arc::new(TransferOrchestrator::new(
        rpc,
        topology,
        tokens,
        sessions,
        cache,
        &settings.transaction,
    ));

    // Initialize metrics server
    let metrics_server = if settings.metrics.enabled {
        Some(MetricsServer::new(settings.metrics.port))
    } else {
        None
    };

    // Start API server
    let api_handle = tokio::spawn({
        let settings = settings.clone();
        let orchestrator = orchestrator.clone();
        async move {
            if let Err(e) = api::run_server(settings.api, orchestrator).await {
                error!("API server error: {}", e);
            }
        }
    });

    // Start metrics server
    let metrics_handle = if let Some(server) = metrics_server {
        Some(tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server error: {}", e);
            }
        }))
    } else {
        None
    };

    info!("Shardflow is running");
    info!("API server: http://{}:{}", settings.api.host, settings.api.port);
    if settings.metrics.enabled {
        info!("Metrics: http://0.0.0.0:{}/metrics", settings.metrics.port);
    }

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutdown signal received, stopping...");

    api_handle.abort();
    if let Some(h) = metrics_handle {
        h.abort();
    }

    info!("Shardflow stopped");
    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shardflow=debug,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
