//! JSON-RPC request and response shapes.

use alloy_primitives::{Address, Bytes, B256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::eth::{parse_quantity, quantity};

/// Parameters of `eth_sendTransaction`. Signing is left to the node.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub from: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    pub data: Bytes,
}

impl TransactionRequest {
    /// A call into an existing contract.
    pub fn call(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to: Some(to),
            data: data.into(),
        }
    }

    /// A contract-creation transaction carrying init code.
    pub fn create(from: Address, init_code: impl Into<Bytes>) -> Self {
        Self {
            from,
            to: None,
            data: init_code.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` failure; absent on pre-Byzantium chains.
    pub status: Option<String>,
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => parse_quantity(status).map(|s| s == 1).unwrap_or(false),
            None => true,
        }
    }

    pub fn block(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(|b| parse_quantity(b).ok())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<String>,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<String>,
}

impl Log {
    pub fn block(&self) -> Option<u64> {
        self.block_number.as_deref().and_then(|b| parse_quantity(b).ok())
    }

    pub fn index(&self) -> Option<u64> {
        self.log_index.as_deref().and_then(|i| parse_quantity(i).ok())
    }
}

/// `eth_getLogs` filter over an inclusive block window.
#[derive(Debug, Clone)]
pub struct LogFilter {
    pub address: Address,
    pub from_block: u64,
    pub to_block: u64,
}

impl LogFilter {
    pub fn to_params(&self) -> Value {
        json!([{
            "address": self.address,
            "fromBlock": quantity(self.from_block),
            "toBlock": quantity(self.to_block),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_request_omits_to() {
        let tx = TransactionRequest::create(Address::ZERO, vec![0x60, 0x80]);
        let v = serde_json::to_value(&tx).unwrap();
        assert!(v.get("to").is_none());
        assert_eq!(v["data"], "0x6080");
        assert_eq!(v.as_object().unwrap().len(), 2);
    }

    #[test]
    fn receipt_status_is_interpreted() {
        let ok: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x1",
            "contractAddress": null,
            "logs": []
        }))
        .unwrap();
        assert!(ok.succeeded());
        assert_eq!(ok.block(), Some(16));

        let failed: TransactionReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "22".repeat(32)),
            "status": "0x0"
        }))
        .unwrap();
        assert!(!failed.succeeded());
        assert!(failed.logs.is_empty());
    }

    #[test]
    fn log_filter_uses_hex_quantities() {
        let filter = LogFilter {
            address: Address::repeat_byte(0xaa),
            from_block: 0,
            to_block: 255,
        };
        let params = filter.to_params();
        assert_eq!(params[0]["fromBlock"], "0x0");
        assert_eq!(params[0]["toBlock"], "0xff");
    }
}
