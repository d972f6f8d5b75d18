//! Wallet connection and the ephemeral session it produces.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use chain_rpc::{eth, Provider};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contract::SupplyChain;
use crate::errors::{Result, TrackerError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tab {
    #[default]
    AddProduct,
    UpdateStatus,
    Verify,
    History,
    Admin,
}

/// Lives in memory only; replaced on reconnect, gone on restart.
#[derive(Clone)]
pub struct Session {
    pub address: Address,
    pub is_owner: bool,
    pub contract: SupplyChain,
}

pub struct ConnectionManager {
    wallet: Option<Arc<dyn Provider>>,
    contract_address: Address,
    receipt_poll: Duration,
}

impl ConnectionManager {
    pub fn new(
        wallet: Option<Arc<dyn Provider>>,
        contract_address: Address,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            wallet,
            contract_address,
            receipt_poll,
        }
    }

    /// Request account access, bind the contract and resolve the owner flag.
    pub async fn connect(&self) -> Result<Session> {
        let wallet = self.wallet.clone().ok_or(TrackerError::WalletUnavailable)?;

        let accounts = eth::request_accounts(wallet.as_ref()).await?;
        let address = *accounts.first().ok_or(TrackerError::NoAccounts)?;

        let session = self.bind(wallet, address).await?;
        info!(%address, is_owner = session.is_owner, contract = %self.contract_address, "Wallet connected");
        Ok(session)
    }

    /// Pick up an account the wallet has already authorised, without
    /// prompting. `None` when there is no wallet or no such account.
    pub async fn restore(&self) -> Result<Option<Session>> {
        let Some(wallet) = self.wallet.clone() else {
            return Ok(None);
        };

        let Some(address) = eth::accounts(wallet.as_ref()).await?.first().copied() else {
            debug!("Wallet has no authorised account yet");
            return Ok(None);
        };

        let session = self.bind(wallet, address).await?;
        info!(%address, is_owner = session.is_owner, "Wallet session restored");
        Ok(Some(session))
    }

    async fn bind(&self, wallet: Arc<dyn Provider>, address: Address) -> Result<Session> {
        let contract = SupplyChain::new(wallet, self.contract_address, address, self.receipt_poll);
        // Address equality is byte-wise, so checksum casing never matters.
        let is_owner = contract.owner().await? == address;
        Ok(Session {
            address,
            is_owner,
            contract,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::tests::{hex_data, ACCOUNT, CONTRACT};
    use alloy_sol_types::SolValue;
    use chain_rpc::mock::MockProvider;
    use serde_json::json;

    fn manager(mock: &Arc<MockProvider>) -> ConnectionManager {
        let wallet: Arc<dyn Provider> = mock.clone();
        ConnectionManager::new(Some(wallet), CONTRACT, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn missing_wallet_fails_without_calls() {
        let connector = ConnectionManager::new(None, CONTRACT, Duration::from_millis(1));
        assert!(matches!(
            connector.connect().await,
            Err(TrackerError::WalletUnavailable)
        ));
    }

    #[tokio::test]
    async fn rejected_access_makes_no_contract_calls() {
        let mock = Arc::new(MockProvider::new());
        mock.fail("eth_requestAccounts", 4001, "User rejected the request.", None);

        let err = manager(&mock).connect().await.err().unwrap();
        assert!(matches!(err, TrackerError::Rpc(chain_rpc::RpcError::UserRejected)));
        assert!(mock.calls_to("eth_call").is_empty());
    }

    #[tokio::test]
    async fn session_address_matches_provider_account() {
        let mock = Arc::new(MockProvider::new());
        mock.respond("eth_requestAccounts", json!([ACCOUNT]));
        mock.respond("eth_call", hex_data(&Address::repeat_byte(0x0b).abi_encode()));

        let session = manager(&mock).connect().await.unwrap();
        assert_eq!(session.address, ACCOUNT);
        assert!(!session.is_owner);
    }

    #[tokio::test]
    async fn owner_is_detected_regardless_of_case() {
        let mock = Arc::new(MockProvider::new());
        let lower = ACCOUNT.to_string().to_lowercase();
        mock.respond("eth_requestAccounts", json!([lower]));
        mock.respond("eth_call", hex_data(&ACCOUNT.abi_encode()));

        let session = manager(&mock).connect().await.unwrap();
        assert!(session.is_owner);
    }

    #[tokio::test]
    async fn restore_without_authorised_account_stays_disconnected() {
        let mock = Arc::new(MockProvider::new());
        mock.respond("eth_accounts", json!([]));

        assert!(manager(&mock).restore().await.unwrap().is_none());
        assert!(mock.calls_to("eth_requestAccounts").is_empty());
        assert!(mock.calls_to("eth_call").is_empty());
    }

    #[tokio::test]
    async fn restore_binds_authorised_account_without_prompting() {
        let mock = Arc::new(MockProvider::new());
        mock.respond("eth_accounts", json!([ACCOUNT]));
        mock.respond("eth_call", hex_data(&ACCOUNT.abi_encode()));

        let session = manager(&mock).restore().await.unwrap().unwrap();
        assert_eq!(session.address, ACCOUNT);
        assert!(session.is_owner);
        assert!(mock.calls_to("eth_requestAccounts").is_empty());
    }

    #[tokio::test]
    async fn restore_without_wallet_is_a_no_op() {
        let connector = ConnectionManager::new(None, CONTRACT, Duration::from_millis(1));
        assert!(connector.restore().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_account_list_is_reported() {
        let mock = Arc::new(MockProvider::new());
        mock.respond("eth_requestAccounts", json!([]));

        assert!(matches!(
            manager(&mock).connect().await,
            Err(TrackerError::NoAccounts)
        ));
    }
}
