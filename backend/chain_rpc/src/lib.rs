//! Ethereum JSON-RPC plumbing shared by the supply-chain binaries.
//!
//! The [`Provider`] trait mirrors the EIP-1193 `request({ method, params })`
//! shape exposed by browser wallets, so the same code path serves a signing
//! node (`eth_requestAccounts`, `eth_sendTransaction`) and a plain read node.
//! The typed helpers in [`eth`] sit on top of any provider.

mod errors;
pub mod eth;
pub mod provider;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use errors::{Result, RpcError};
pub use provider::{HttpProvider, Provider};
pub use types::{Log, LogFilter, TransactionReceipt, TransactionRequest};
