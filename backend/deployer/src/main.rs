//! Deploys a compiled contract with a token address as its constructor
//! argument and prints the new contract's address.
//!
//! stdout carries exactly one line, the checksummed address; all logging
//! goes to stderr. Any failure exits with a non-zero status.

mod artifact;
mod config;
mod deploy;
mod errors;

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use alloy_primitives::Address;
use chain_rpc::{HttpProvider, Provider};
use reqwest::Client;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use artifact::ContractFactory;
use config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let _ = dotenvy::dotenv();

    finish(deploy_from_env().await, &mut std::io::stdout())
}

async fn deploy_from_env() -> anyhow::Result<Address> {
    let config = Config::from_env()?;
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    let provider = HttpProvider::new(client, config.rpc_url.clone());
    run(&config, &provider).await
}

/// Load the artifact, then deploy it through `provider`.
async fn run(config: &Config, provider: &dyn Provider) -> anyhow::Result<Address> {
    let factory = ContractFactory::load(&config.artifacts_dir, &config.contract_name)?;

    let from = deploy::resolve_deployer(provider, config.deployer_address).await?;
    let deployment = deploy::deploy(
        provider,
        &factory,
        config.token_address,
        from,
        Duration::from_millis(config.receipt_poll_millis),
    )
    .await?;

    info!(
        contract = %factory.name,
        address = %deployment.address,
        tx_hash = %deployment.tx_hash,
        block = ?deployment.block,
        "{} deployed",
        factory.name
    );
    Ok(deployment.address)
}

/// Write the address line on success and map the outcome to an exit code.
fn finish(result: anyhow::Result<Address>, out: &mut impl Write) -> ExitCode {
    match result {
        Ok(address) => match writeln!(out, "{address}") {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("Could not write deployed address: {e}");
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("Deployment failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}
