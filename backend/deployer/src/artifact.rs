//! Compiled contract artifacts and the deployment payload built from them.
//!
//! Hardhat writes `artifacts/contracts/<Name>.sol/<Name>.json` with the init
//! code as a hex string under `bytecode`. Foundry writes
//! `out/<Name>.sol/<Name>.json` with the init code under `bytecode.object`.

use std::path::{Path, PathBuf};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolValue;
use serde::Deserialize;
use tracing::debug;

use crate::errors::{DeployError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Bytecode {
    Hex(String),
    Object { object: String },
}

impl Bytecode {
    fn as_hex(&self) -> &str {
        match self {
            Self::Hex(hex) => hex,
            Self::Object { object } => object,
        }
    }
}

#[derive(Debug, Deserialize)]
struct AbiItem {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct Artifact {
    abi: Vec<AbiItem>,
    bytecode: Bytecode,
}

/// Init code of a contract whose constructor takes one `address`.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    pub name: String,
    bytecode: Bytes,
}

impl ContractFactory {
    /// Locate and load `<Name>.sol/<Name>.json` under `artifacts_dir`.
    pub fn load(artifacts_dir: &Path, name: &str) -> Result<Self> {
        let candidates = artifact_paths(artifacts_dir, name);
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| DeployError::ArtifactNotFound {
                name: name.to_string(),
                searched: candidates.iter().map(|p| p.display().to_string()).collect(),
            })?;

        debug!(artifact = %path.display(), "Loading contract artifact");
        let raw = std::fs::read_to_string(path).map_err(|source| DeployError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_json(name, &raw)
    }

    pub fn from_json(name: &str, raw: &str) -> Result<Self> {
        let artifact: Artifact = serde_json::from_str(raw)?;

        let constructor = artifact.abi.iter().find(|item| item.kind == "constructor");
        let params: Vec<&str> = constructor
            .map(|c| c.inputs.iter().map(|p| p.kind.as_str()).collect())
            .unwrap_or_default();
        if params != ["address"] {
            return Err(DeployError::Artifact(format!(
                "{name} constructor takes ({}), expected (address)",
                params.join(",")
            )));
        }

        let code = artifact.bytecode.as_hex();
        let bytecode = hex::decode(code.trim().trim_start_matches("0x"))
            .map_err(|e| DeployError::Artifact(format!("{name} bytecode is not hex: {e}")))?;
        if bytecode.is_empty() {
            return Err(DeployError::Artifact(format!(
                "{name} has no bytecode (abstract contract or interface?)"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            bytecode: bytecode.into(),
        })
    }

    /// Init code followed by the ABI-encoded constructor argument.
    pub fn deploy_data(&self, token: Address) -> Bytes {
        [self.bytecode.as_ref(), token.abi_encode().as_slice()]
            .concat()
            .into()
    }
}

fn artifact_paths(dir: &Path, name: &str) -> Vec<PathBuf> {
    let file = format!("{name}.json");
    let source = format!("{name}.sol");
    vec![
        dir.join("contracts").join(&source).join(&file),
        dir.join(&source).join(&file),
    ]
}
