//! Canonical events emitted by the supply-chain contract and their decoding
//! from raw `eth_getLogs` entries.

use alloy_primitives::{B256, U256};
use alloy_sol_types::SolEvent;
use chain_rpc::Log;
use serde::Serialize;
use tracing::debug;

use crate::contract::ISupplyChain::{AuthorityGranted, ProductAdded, StatusUpdated};

/// All recognised event kinds from the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A manufacturer registered a product.
    ProductAdded,
    /// A product moved along the chain.
    StatusUpdated,
    /// The owner granted a manufacturer or logistics role.
    AuthorityGranted,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Classify a log by its first topic (the event signature hash).
    pub fn from_topic(topic: &B256) -> Self {
        if *topic == ProductAdded::SIGNATURE_HASH {
            Self::ProductAdded
        } else if *topic == StatusUpdated::SIGNATURE_HASH {
            Self::StatusUpdated
        } else if *topic == AuthorityGranted::SIGNATURE_HASH {
            Self::AuthorityGranted
        } else {
            Self::Unknown
        }
    }

    /// Return a short identifier string suitable for storage in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductAdded => "product_added",
            Self::StatusUpdated => "status_updated",
            Self::AuthorityGranted => "authority_granted",
            Self::Unknown => "unknown",
        }
    }
}

/// A fully decoded contract event, ready to be stored in the database.
#[derive(Debug, Clone)]
pub struct ChainEvent {
    pub event_type: String,
    pub product_id: Option<String>,
    /// Account that performed the action.
    pub actor: Option<String>,
    /// Account the action was about (role grants only).
    pub subject: Option<String>,
    /// Product name, new location or granted role.
    pub detail: Option<String>,
    pub status: Option<i64>,
    pub block_number: i64,
    pub log_index: i64,
    pub timestamp: i64,
    pub contract_address: String,
    pub tx_hash: String,
}

/// An event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub product_id: Option<String>,
    pub actor: Option<String>,
    pub subject: Option<String>,
    pub detail: Option<String>,
    pub status: Option<i64>,
    pub block_number: i64,
    pub log_index: i64,
    pub timestamp: i64,
    pub contract_address: String,
    pub tx_hash: String,
    pub created_at: i64,
}

/// Decode raw logs; pending logs (no hash or block yet) and logs that fail
/// to decode are dropped.
pub fn decode_logs(logs: &[Log]) -> Vec<ChainEvent> {
    logs.iter().filter_map(decode_single).collect()
}

fn decode_single(log: &Log) -> Option<ChainEvent> {
    let kind = EventKind::from_topic(log.topics.first()?);
    let tx_hash = log.transaction_hash?;
    let block_number = log.block()? as i64;

    let mut event = ChainEvent {
        event_type: kind.as_str().to_string(),
        product_id: None,
        actor: None,
        subject: None,
        detail: None,
        status: None,
        block_number,
        log_index: log.index().unwrap_or(0) as i64,
        timestamp: 0,
        contract_address: log.address.to_string(),
        tx_hash: tx_hash.to_string(),
    };

    let topics = log.topics.iter().copied();
    let decoded = match kind {
        EventKind::ProductAdded => ProductAdded::decode_raw_log(topics, &log.data, true)
            .map(|e| {
                event.product_id = Some(e.product_id.to_string());
                event.actor = Some(e.manufacturer.to_string());
                event.detail = Some(e.name);
                event.timestamp = unix_secs(e.timestamp);
            }),
        EventKind::StatusUpdated => StatusUpdated::decode_raw_log(topics, &log.data, true)
            .map(|e| {
                event.product_id = Some(e.product_id.to_string());
                event.actor = Some(e.updated_by.to_string());
                event.detail = Some(e.location);
                event.status = Some(i64::from(e.status));
                event.timestamp = unix_secs(e.timestamp);
            }),
        EventKind::AuthorityGranted => AuthorityGranted::decode_raw_log(topics, &log.data, true)
            .map(|e| {
                event.actor = Some(e.granted_by.to_string());
                event.subject = Some(e.account.to_string());
                event.detail = Some(e.role);
            }),
        EventKind::Unknown => Ok(()),
    };

    if let Err(e) = decoded {
        debug!(tx_hash = %tx_hash, kind = kind.as_str(), "Skipping undecodable log: {e}");
        return None;
    }
    Some(event)
}

fn unix_secs(value: U256) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
