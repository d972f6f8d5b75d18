//! Supply-chain tracker entry point.
//!
//! Serves the tracker dashboard as a REST API: wallet connection, the
//! product forms and the authenticity/history lookups all go through the
//! contract via the configured wallet endpoint. A background task indexes
//! the contract's events into SQLite for the activity feed.

mod actions;
mod api;
mod config;
mod contract;
mod db;
mod errors;
mod events;
mod forms;
mod indexer;
mod notify;
mod session;
mod status;
mod views;

use std::sync::Arc;
use std::time::Duration;

use chain_rpc::{HttpProvider, Provider};
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use actions::Dashboard;
use config::Config;
use indexer::IndexerState;
use session::ConnectionManager;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    let pool = db::init_pool(&config.database_url).await?;

    // Shared by the indexer and the wallet endpoint.
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    // ─── Background indexer ───────────────────────────────
    let shutdown = CancellationToken::new();
    let indexer_state = Arc::new(IndexerState {
        pool: pool.clone(),
        config: config.clone(),
        provider: HttpProvider::new(client.clone(), config.rpc_url.clone())
            .with_retries(config.rpc_max_retries),
    });
    let indexer_task = tokio::spawn(indexer::run(indexer_state, shutdown.clone()));

    // ─── Wallet ───────────────────────────────────────────
    let wallet: Option<Arc<dyn Provider>> = match &config.wallet_rpc_url {
        Some(url) => {
            info!(wallet = %url, "Wallet endpoint configured");
            Some(Arc::new(HttpProvider::new(client, url.clone())))
        }
        None => {
            warn!("WALLET_RPC_URL not set; wallet connection will be unavailable");
            None
        }
    };
    let connector = ConnectionManager::new(
        wallet,
        config.contract_address,
        Duration::from_millis(config.receipt_poll_millis),
    );

    // Pick up an already-authorised account, like a page load would.
    let dashboard = Dashboard::new(connector);
    match dashboard.restore().await {
        Ok(Some(session)) => info!(address = %session.address, "Resumed wallet session"),
        Ok(None) => info!("No authorised wallet account; waiting for connect"),
        Err(e) => warn!("Could not restore wallet session: {e}"),
    }

    // ─── REST API ─────────────────────────────────────────
    let api_state = Arc::new(api::ApiState { dashboard, pool });
    let app = api::router(api_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    indexer_task.await?;
    info!("Tracker stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Could not listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}
