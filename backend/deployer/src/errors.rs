use std::path::PathBuf;

use alloy_primitives::B256;
use chain_rpc::RpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("No artifact for contract {name} (looked in {})", searched.join(", "))]
    ArtifactNotFound { name: String, searched: Vec<String> },

    #[error("Invalid artifact: {0}")]
    Artifact(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Rpc(#[from] RpcError),

    #[error("Node exposes no accounts; set DEPLOYER_ADDRESS")]
    NoAccounts,

    #[error("Receipt for {0} carries no contract address")]
    MissingContractAddress(B256),
}

pub type Result<T> = std::result::Result<T, DeployError>;
