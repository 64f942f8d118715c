//! ussd-data-service: process wiring
//!
//! Loads configuration and named queries, connects the store and the chain
//! client, and serves the API until SIGINT or SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chain_client::ChainClient;
use clap::Parser;
use pg_store::{PgStore, Queries};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use ussd_api::{start_server, AppState};
use ussd_core::AppConfig;

/// In-flight requests get this long to finish once shutdown starts
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(20);

/// Wait after cancelling leftover requests before aborting the server task
const CANCEL_SETTLE: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[command(author, version, about = "USSD chain data service")]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to the named-query SQL file
    #[arg(long, default_value = "queries.sql")]
    pub queries: PathBuf,
}

/// Install the global subscriber. `RUST_LOG` overrides the defaults.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ussd_data_service=debug,info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Run the service until a shutdown signal arrives
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("Starting USSD data service");

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    let queries = Queries::load(&cli.queries)
        .with_context(|| format!("loading queries from {}", cli.queries.display()))?;
    let addr: SocketAddr = config
        .api
        .address
        .parse()
        .with_context(|| format!("invalid listen address {}", config.api.address))?;

    let store = PgStore::connect(&config.postgres, queries).await?;
    let chain = ChainClient::new(&config.chain)?;
    check_chain(&chain, config.chain.chain_id).await;

    let shutdown = CancellationToken::new();
    let state = AppState::with_page_size(
        Arc::new(store),
        Arc::new(chain),
        shutdown.clone(),
        config.chain.registry_page_size,
    );

    let stop = CancellationToken::new();
    let mut server = tokio::spawn(start_server(state, addr, stop.clone().cancelled_owned()));

    tokio::select! {
        _ = shutdown_signal() => {}
        joined = &mut server => {
            // the server only returns on its own when it failed
            joined??;
            return Ok(());
        }
    }

    tracing::info!("Shutdown signal received, draining requests");
    drain(server, stop, shutdown, SHUTDOWN_GRACE).await?;

    tracing::info!("Stopped");
    Ok(())
}

/// Stop accepting connections and give in-flight requests `grace` to finish.
/// Requests still running after that are cancelled through `requests`.
async fn drain(
    mut server: JoinHandle<std::io::Result<()>>,
    stop: CancellationToken,
    requests: CancellationToken,
    grace: Duration,
) -> anyhow::Result<()> {
    stop.cancel();

    if let Ok(joined) = tokio::time::timeout(grace, &mut server).await {
        joined??;
        return Ok(());
    }

    tracing::warn!(
        grace_secs = grace.as_secs(),
        "Grace period over, cancelling in-flight requests"
    );
    requests.cancel();

    match tokio::time::timeout(CANCEL_SETTLE, &mut server).await {
        Ok(joined) => joined??,
        Err(_) => {
            tracing::error!("API server did not stop, aborting");
            server.abort();
        }
    }
    Ok(())
}

/// Log whether the RPC endpoint answers and serves the configured chain.
/// An unreachable endpoint is not fatal; reads fail per request instead.
async fn check_chain(chain: &ChainClient, expected: u64) {
    match chain.chain_id().await {
        Ok(id) if id == expected => tracing::info!(chain_id = id, "RPC endpoint online"),
        Ok(id) => tracing::warn!(
            chain_id = id,
            expected,
            "RPC endpoint serves a different chain"
        ),
        Err(e) => tracing::warn!("RPC endpoint not reachable: {}", e),
    }
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
