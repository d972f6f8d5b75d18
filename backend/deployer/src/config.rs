//! Deployment settings loaded from environment variables.

use std::path::PathBuf;
use std::str::FromStr;

use alloy_primitives::Address;

use crate::errors::{DeployError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Node that holds the deployer account and signs the creation transaction
    pub rpc_url: String,
    /// Constructor argument of the deployed contract
    pub token_address: Address,
    /// Contract name, resolved to `<Name>.sol/<Name>.json` inside the artifacts
    pub contract_name: String,
    pub artifacts_dir: PathBuf,
    /// Sending account; the node's first account when unset
    pub deployer_address: Option<Address>,
    pub receipt_poll_millis: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = var("RPC_URL").unwrap_or_else(|| "http://127.0.0.1:8545".to_string());
        validate_url("RPC_URL", &rpc_url)?;

        let token = var("TOKEN_ADDRESS").ok_or_else(|| {
            DeployError::Config("TOKEN_ADDRESS environment variable is required".to_string())
        })?;

        let deployer_address = var("DEPLOYER_ADDRESS")
            .map(|raw| parse_address("DEPLOYER_ADDRESS", &raw))
            .transpose()?;

        Ok(Config {
            rpc_url,
            token_address: parse_address("TOKEN_ADDRESS", &token)?,
            contract_name: var("DEPLOY_CONTRACT").unwrap_or_else(|| "Project".to_string()),
            artifacts_dir: var("ARTIFACTS_DIR")
                .unwrap_or_else(|| "artifacts".to_string())
                .into(),
            deployer_address,
            receipt_poll_millis: match var("RECEIPT_POLL_MILLIS") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| DeployError::Config("Invalid RECEIPT_POLL_MILLIS".into()))?,
                None => 1000,
            },
        })
    }
}

fn parse_address(key: &str, raw: &str) -> Result<Address> {
    Address::from_str(raw.trim())
        .map_err(|_| DeployError::Config(format!("Invalid {key}: {raw}")))
}

fn validate_url(key: &str, raw: &str) -> Result<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| DeployError::Config(format!("Invalid {key} ({raw}): {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host().is_some() => Ok(()),
        _ => Err(DeployError::Config(format!(
            "{key} must be an http(s) URL: {raw}"
        ))),
    }
}
