//! Transport and node error types.

use alloy_primitives::B256;
use alloy_sol_types::{Revert, SolError};
use serde_json::Value;
use thiserror::Error;

/// EIP-1193 "user rejected the request".
const USER_REJECTED: i64 = 4001;
/// Geth/Anvil code for a reverted `eth_call` / `eth_estimateGas`.
const EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("execution reverted: {0}")]
    Revert(String),

    #[error("user rejected the request")]
    UserRejected,

    #[error("rate-limited by RPC endpoint")]
    RateLimited,

    #[error("transaction {0} reverted")]
    TransactionFailed(B256),

    #[error("invalid RPC response: {0}")]
    InvalidResponse(String),
}

pub type Result<T> = std::result::Result<T, RpcError>;

impl RpcError {
    /// Classify a JSON-RPC error object returned by the node.
    pub fn from_payload(code: i64, message: String, data: Option<&Value>) -> Self {
        if code == USER_REJECTED {
            return Self::UserRejected;
        }
        if code == EXECUTION_REVERTED || message.to_ascii_lowercase().contains("revert") {
            let reason = data
                .and_then(revert_data)
                .and_then(|bytes| Revert::abi_decode(&bytes, true).ok())
                .map(|revert| revert.reason)
                .unwrap_or_else(|| strip_revert_prefix(&message));
            return Self::Revert(reason);
        }
        Self::Node { code, message }
    }

    /// Whether the contract itself rejected the call or transaction.
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Revert(_) | Self::TransactionFailed(_))
    }
}

/// Revert data arrives either as a bare hex string or nested under `data`
/// (Hardhat wraps it in an object).
fn revert_data(data: &Value) -> Option<Vec<u8>> {
    let raw = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    hex::decode(raw.trim_start_matches("0x")).ok()
}

fn strip_revert_prefix(message: &str) -> String {
    let trimmed = message
        .trim_start_matches("execution reverted")
        .trim_start_matches(':')
        .trim();
    if trimmed.is_empty() {
        "no reason given".to_string()
    } else {
        trimmed.to_string()
    }
}
