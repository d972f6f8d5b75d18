//! Application configuration loaded from environment variables.

use std::str::FromStr;

use alloy_primitives::Address;

use crate::errors::{Result, TrackerError};

#[derive(Debug, Clone)]
pub struct Config {
    /// The deployed supply-chain contract.
    pub contract_address: Address,
    /// Wallet endpoint that owns the user's accounts and signs transactions.
    /// `None` means no wallet provider is available.
    pub wallet_rpc_url: Option<String>,
    /// Read-only node used by the event indexer.
    pub rpc_url: String,
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// How often (in seconds) to poll the node for new logs
    pub poll_interval_secs: u64,
    /// Maximum number of blocks covered by one `eth_getLogs` request
    pub log_block_range: u64,
    /// Block to start from if no cursor is saved
    pub start_block: u64,
    /// Interval between receipt polls while a transaction is pending
    pub receipt_poll_millis: u64,
    /// Transport retries for the indexer's node connection
    pub rpc_max_retries: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let contract_address = env_var("CONTRACT_ADDRESS").map_err(|_| {
            TrackerError::Config("CONTRACT_ADDRESS environment variable is required".to_string())
        })?;
        let wallet_rpc_url = env_var("WALLET_RPC_URL").ok().filter(|u| !u.trim().is_empty());
        let rpc_url = env_var("RPC_URL").unwrap_or_else(|_| "http://127.0.0.1:8545".to_string());

        if let Some(url) = &wallet_rpc_url {
            validate_url("WALLET_RPC_URL", url)?;
        }
        validate_url("RPC_URL", &rpc_url)?;

        Ok(Config {
            contract_address: Address::from_str(contract_address.trim()).map_err(|_| {
                TrackerError::Config(format!("Invalid CONTRACT_ADDRESS: {contract_address}"))
            })?,
            wallet_rpc_url,
            rpc_url,
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./supply_chain_events.db".to_string()),
            api_port: parse_or("API_PORT", 3001)?,
            poll_interval_secs: parse_or("POLL_INTERVAL_SECS", 5)?,
            log_block_range: parse_or("LOG_BLOCK_RANGE", 1000)?,
            start_block: parse_or("START_BLOCK", 0)?,
            receipt_poll_millis: parse_or("RECEIPT_POLL_MILLIS", 1000)?,
            rpc_max_retries: parse_or("RPC_MAX_RETRIES", 5)?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| TrackerError::Config(format!("Missing env var: {key}")))
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| TrackerError::Config(format!("Invalid {key}"))),
        Err(_) => Ok(default),
    }
}

fn validate_url(key: &str, raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| TrackerError::Config(format!("Invalid {key} ({raw}): {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        _ => Err(TrackerError::Config(format!(
            "{key} must be an http(s) URL: {raw}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_urls_are_accepted() {
        assert!(validate_url("RPC_URL", "http://127.0.0.1:8545").is_ok());
        assert!(validate_url("RPC_URL", "https://sepolia.example.org/rpc").is_ok());
    }

    #[test]
    fn non_http_urls_are_rejected() {
        assert!(validate_url("RPC_URL", "ws://127.0.0.1:8546").is_err());
        assert!(validate_url("RPC_URL", "not a url").is_err());
    }
}
