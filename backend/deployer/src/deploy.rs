use std::time::Duration;

use alloy_primitives::{Address, B256};
use chain_rpc::{eth, Provider, TransactionRequest};
use tracing::info;

use crate::artifact::ContractFactory;
use crate::errors::{DeployError, Result};

#[derive(Debug, Clone)]
pub struct Deployment {
    pub address: Address,
    pub tx_hash: B256,
    pub block: Option<u64>,
}

/// The configured sender, or the first account the node manages.
pub async fn resolve_deployer(
    provider: &dyn Provider,
    configured: Option<Address>,
) -> Result<Address> {
    if let Some(address) = configured {
        return Ok(address);
    }
    eth::accounts(provider)
        .await?
        .first()
        .copied()
        .ok_or(DeployError::NoAccounts)
}

/// Send the creation transaction and wait until it is mined.
pub async fn deploy(
    provider: &dyn Provider,
    factory: &ContractFactory,
    token: Address,
    from: Address,
    receipt_poll: Duration,
) -> Result<Deployment> {
    let chain_id = eth::chain_id(provider).await?;
    info!(contract = %factory.name, %from, %token, chain_id, "Deploying");

    let tx = TransactionRequest::create(from, factory.deploy_data(token));
    let tx_hash = eth::send_transaction(provider, &tx).await?;
    let receipt = eth::wait_for_receipt(provider, tx_hash, receipt_poll).await?;

    let address = receipt
        .contract_address
        .ok_or(DeployError::MissingContractAddress(tx_hash))?;
    Ok(Deployment {
        address,
        tx_hash,
        block: receipt.block(),
    })
}
