//! Typed `eth_*` helpers over any [`Provider`].

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::{Result, RpcError};
use crate::provider::Provider;
use crate::types::{Log, LogFilter, TransactionReceipt, TransactionRequest};

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|_| RpcError::InvalidResponse(format!("bad quantity: {raw}")))
}

/// Encode a quantity the way JSON-RPC expects it (no leading zeros).
pub fn quantity(value: u64) -> String {
    format!("0x{value:x}")
}

async fn request_as<T: DeserializeOwned>(
    provider: &dyn Provider,
    method: &str,
    params: Value,
) -> Result<T> {
    let value = provider.request(method, params).await?;
    Ok(serde_json::from_value(value)?)
}

/// Ask the wallet for account access (`eth_requestAccounts`).
pub async fn request_accounts(provider: &dyn Provider) -> Result<Vec<Address>> {
    request_as(provider, "eth_requestAccounts", json!([])).await
}

/// Accounts the node already exposes (`eth_accounts`).
pub async fn accounts(provider: &dyn Provider) -> Result<Vec<Address>> {
    request_as(provider, "eth_accounts", json!([])).await
}

pub async fn chain_id(provider: &dyn Provider) -> Result<u64> {
    let raw: String = request_as(provider, "eth_chainId", json!([])).await?;
    parse_quantity(&raw)
}

pub async fn block_number(provider: &dyn Provider) -> Result<u64> {
    let raw: String = request_as(provider, "eth_blockNumber", json!([])).await?;
    parse_quantity(&raw)
}

/// Execute a read-only call against the latest block.
pub async fn call(provider: &dyn Provider, to: Address, data: &[u8]) -> Result<Bytes> {
    let params = json!([{ "to": to, "data": Bytes::copy_from_slice(data) }, "latest"]);
    request_as(provider, "eth_call", params).await
}

pub async fn send_transaction(provider: &dyn Provider, tx: &TransactionRequest) -> Result<B256> {
    let hash: B256 = request_as(provider, "eth_sendTransaction", json!([tx])).await?;
    info!(tx_hash = %hash, from = %tx.from, "Transaction submitted");
    Ok(hash)
}

pub async fn transaction_receipt(
    provider: &dyn Provider,
    hash: B256,
) -> Result<Option<TransactionReceipt>> {
    request_as(provider, "eth_getTransactionReceipt", json!([hash])).await
}

/// Poll for the receipt until the transaction is mined.
///
/// There is no deadline: a transaction that never gets mined keeps the
/// caller waiting. A mined-but-failed transaction is an error.
pub async fn wait_for_receipt(
    provider: &dyn Provider,
    hash: B256,
    poll_interval: Duration,
) -> Result<TransactionReceipt> {
    loop {
        if let Some(receipt) = transaction_receipt(provider, hash).await? {
            if !receipt.succeeded() {
                return Err(RpcError::TransactionFailed(hash));
            }
            info!(tx_hash = %hash, block = ?receipt.block(), "Transaction confirmed");
            return Ok(receipt);
        }
        debug!(tx_hash = %hash, "Receipt not available yet");
        tokio::time::sleep(poll_interval).await;
    }
}

pub async fn get_logs(provider: &dyn Provider, filter: &LogFilter) -> Result<Vec<Log>> {
    request_as(provider, "eth_getLogs", filter.to_params()).await
}
