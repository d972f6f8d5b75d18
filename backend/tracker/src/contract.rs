//! Typed handle over the deployed supply-chain contract.
//!
//! Reads go through `eth_call`; writes are sent with `eth_sendTransaction`
//! from the connected account and are only reported back once the receipt
//! shows they were mined successfully.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall, SolEvent};
use chain_rpc::{eth, Provider, TransactionReceipt, TransactionRequest};
use tracing::{debug, info};

use crate::errors::{Result, TrackerError};
use crate::forms::{NewProduct, StatusChange};

sol! {
    interface ISupplyChain {
        struct StatusUpdate {
            uint256 timestamp;
            uint8 status;
            string location;
            address updated_by;
            string notes;
        }

        event AuthorityGranted(address indexed account, string role, address indexed granted_by);
        event ProductAdded(uint256 indexed product_id, string name, address indexed manufacturer, uint256 timestamp);
        event StatusUpdated(uint256 indexed product_id, uint8 status, string location, address indexed updated_by, uint256 timestamp);

        function addProduct(string memory name, string memory description, string memory manufacturing_location, uint256 price) external returns (uint256);
        function updateStatus(uint256 product_id, uint8 new_status, string memory location, string memory notes) external;
        function verifyAuthenticity(uint256 product_id) external view returns (
            bool is_authentic,
            string memory product_name,
            address manufacturer,
            uint256 manufacturing_date,
            uint8 current_status,
            string memory current_location,
            address current_owner,
            uint256 price,
            uint256 total_updates
        );
        function authorizeManufacturer(address manufacturer) external;
        function authorizeLogistics(address logistics) external;
        function markAsCounterfeit(uint256 product_id) external;
        function getProductHistory(uint256 product_id) external view returns (StatusUpdate[] memory);
        function owner() external view returns (address);
        function productCount() external view returns (uint256);
    }
}

pub use ISupplyChain::{verifyAuthenticityReturn as Verification, StatusUpdate};

#[derive(Clone)]
pub struct SupplyChain {
    provider: Arc<dyn Provider>,
    address: Address,
    sender: Address,
    receipt_poll: Duration,
}

impl SupplyChain {
    pub fn new(
        provider: Arc<dyn Provider>,
        address: Address,
        sender: Address,
        receipt_poll: Duration,
    ) -> Self {
        Self {
            provider,
            address,
            sender,
            receipt_poll,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn view<C>(&self, call: C) -> Result<C::Return>
    where
        C: SolCall + Send,
    {
        let data = call.abi_encode();
        let out = eth::call(self.provider.as_ref(), self.address, &data).await?;
        debug!(function = C::SIGNATURE, bytes = out.len(), "View call returned");
        C::abi_decode_returns(&out, true)
            .map_err(|e| TrackerError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }

    async fn transact<C>(&self, call: C) -> Result<TransactionReceipt>
    where
        C: SolCall + Send,
    {
        let tx = TransactionRequest::call(self.sender, self.address, call.abi_encode());
        info!(function = C::SIGNATURE, from = %self.sender, "Submitting contract write");
        let hash = eth::send_transaction(self.provider.as_ref(), &tx).await?;
        Ok(eth::wait_for_receipt(self.provider.as_ref(), hash, self.receipt_poll).await?)
    }

    pub async fn owner(&self) -> Result<Address> {
        Ok(self.view(ISupplyChain::ownerCall {}).await?._0)
    }

    pub async fn product_count(&self) -> Result<U256> {
        Ok(self.view(ISupplyChain::productCountCall {}).await?._0)
    }

    /// `None` when the contract rejects the lookup (e.g. unknown product id).
    pub async fn verify_authenticity(&self, product_id: U256) -> Result<Option<Verification>> {
        match self
            .view(ISupplyChain::verifyAuthenticityCall { product_id })
            .await
        {
            Ok(verification) => Ok(Some(verification)),
            Err(TrackerError::Rpc(e)) if e.is_revert() => {
                debug!(%product_id, "Verification reverted: {e}");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn product_history(&self, product_id: U256) -> Result<Vec<StatusUpdate>> {
        Ok(self
            .view(ISupplyChain::getProductHistoryCall { product_id })
            .await?
            ._0)
    }

    pub async fn add_product(&self, product: NewProduct) -> Result<TransactionReceipt> {
        self.transact(ISupplyChain::addProductCall {
            name: product.name,
            description: product.description,
            manufacturing_location: product.manufacturing_location,
            price: product.price,
        })
        .await
    }

    pub async fn update_status(&self, change: StatusChange) -> Result<TransactionReceipt> {
        self.transact(ISupplyChain::updateStatusCall {
            product_id: change.product_id,
            new_status: change.status.code(),
            location: change.location,
            notes: change.notes,
        })
        .await
    }

    pub async fn authorize_manufacturer(&self, manufacturer: Address) -> Result<TransactionReceipt> {
        self.transact(ISupplyChain::authorizeManufacturerCall { manufacturer })
            .await
    }

    pub async fn authorize_logistics(&self, logistics: Address) -> Result<TransactionReceipt> {
        self.transact(ISupplyChain::authorizeLogisticsCall { logistics })
            .await
    }

    pub async fn mark_as_counterfeit(&self, product_id: U256) -> Result<TransactionReceipt> {
        self.transact(ISupplyChain::markAsCounterfeitCall { product_id })
            .await
    }

    /// Id assigned by the contract, read from the receipt's `ProductAdded` log.
    pub fn added_product_id(&self, receipt: &TransactionReceipt) -> Option<U256> {
        receipt
            .logs
            .iter()
            .filter(|log| log.address == self.address)
            .filter(|log| log.topics.first() == Some(&ISupplyChain::ProductAdded::SIGNATURE_HASH))
            .find_map(|log| {
                ISupplyChain::ProductAdded::decode_raw_log(log.topics.iter().copied(), &log.data, true)
                    .ok()
            })
            .map(|event| event.product_id)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloy_primitives::{hex, B256};
    use alloy_sol_types::SolValue;
    use chain_rpc::mock::MockProvider;
    use serde_json::{json, Value};

    pub(crate) const CONTRACT: Address = Address::repeat_byte(0xc0);
    pub(crate) const ACCOUNT: Address = Address::repeat_byte(0xa1);

    pub(crate) fn hex_data(bytes: &[u8]) -> Value {
        json!(hex::encode_prefixed(bytes))
    }

    pub(crate) fn receipt_with_logs(logs: Value) -> Value {
        json!({
            "transactionHash": B256::repeat_byte(0x77),
            "blockNumber": "0x5",
            "status": "0x1",
            "contractAddress": null,
            "logs": logs
        })
    }

    pub(crate) fn product_added_log(product_id: u64) -> Value {
        let event = ISupplyChain::ProductAdded {
            product_id: U256::from(product_id),
            name: "Widget".to_string(),
            manufacturer: ACCOUNT,
            timestamp: U256::from(1_700_000_000u64),
        };
        let log = event.encode_log_data();
        json!({
            "address": CONTRACT,
            "topics": log.topics(),
            "data": hex_data(&log.data),
            "blockNumber": "0x5",
            "transactionHash": B256::repeat_byte(0x77),
            "logIndex": "0x0"
        })
    }

    pub(crate) fn handle(mock: Arc<MockProvider>) -> SupplyChain {
        SupplyChain::new(mock, CONTRACT, ACCOUNT, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn owner_is_decoded() {
        let mock = Arc::new(MockProvider::new());
        mock.respond("eth_call", hex_data(&ACCOUNT.abi_encode()));

        let owner = handle(mock.clone()).owner().await.unwrap();
        assert_eq!(owner, ACCOUNT);

        let params = &mock.calls_to("eth_call")[0];
        let selector = hex_data(&ISupplyChain::ownerCall::SELECTOR);
        assert_eq!(params[0]["data"], selector);
    }

    #[tokio::test]
    async fn add_product_encodes_arguments_in_order() {
        let mock = Arc::new(MockProvider::new());
        mock.respond("eth_sendTransaction", json!(B256::repeat_byte(0x77)));
        mock.respond("eth_getTransactionReceipt", receipt_with_logs(json!([])));

        let product = NewProduct {
            name: "Widget".into(),
            description: "Blue widget".into(),
            manufacturing_location: "Lyon".into(),
            price: U256::from(1500u64),
        };
        handle(mock.clone()).add_product(product).await.unwrap();

        let sent = mock.calls_to("eth_sendTransaction");
        assert_eq!(sent.len(), 1);
        let bytes = hex::decode(sent[0][0]["data"].as_str().unwrap()).unwrap();
        let decoded = ISupplyChain::addProductCall::abi_decode(&bytes, true).unwrap();
        assert_eq!(decoded.name, "Widget");
        assert_eq!(decoded.description, "Blue widget");
        assert_eq!(decoded.manufacturing_location, "Lyon");
        assert_eq!(decoded.price, U256::from(1500u64));
        assert_eq!(sent[0][0]["to"], json!(CONTRACT));
        assert_eq!(sent[0][0]["from"], json!(ACCOUNT));
    }

    #[tokio::test]
    async fn verification_of_unknown_product_is_not_an_error() {
        let mock = Arc::new(MockProvider::new());
        mock.fail("eth_call", 3, "execution reverted: Product does not exist", None);

        let result = handle(mock).verify_authenticity(U256::from(999u64)).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn transport_errors_still_surface_from_verification() {
        let mock = Arc::new(MockProvider::new());
        mock.fail("eth_call", -32000, "header not found", None);

        let result = handle(mock).verify_authenticity(U256::from(1u64)).await;
        assert!(matches!(result, Err(TrackerError::Rpc(_))));
    }

    #[tokio::test]
    async fn history_is_decoded() {
        let mock = Arc::new(MockProvider::new());
        let history = vec![StatusUpdate {
            timestamp: U256::from(1_700_000_000u64),
            status: 1,
            location: "Port of Rotterdam".into(),
            updated_by: ACCOUNT,
            notes: "Loaded".into(),
        }];
        let encoded = ISupplyChain::getProductHistoryCall::abi_encode_returns(&(history,));
        mock.respond("eth_call", hex_data(&encoded));

        let records = handle(mock).product_history(U256::from(1u64)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].location, "Port of Rotterdam");
        assert_eq!(records[0].status, 1);
    }

    #[tokio::test]
    async fn added_product_id_comes_from_receipt() {
        let mock = Arc::new(MockProvider::new());
        let receipt: TransactionReceipt =
            serde_json::from_value(receipt_with_logs(json!([product_added_log(7)]))).unwrap();
        assert_eq!(handle(mock).added_product_id(&receipt), Some(U256::from(7u64)));
    }
}
