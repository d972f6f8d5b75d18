//! User actions: the connect button, the five forms and the two lookups.
//!
//! Writes are serialised through a single gate. A second write that arrives
//! while one is still waiting for its receipt is turned away instead of
//! queued, the same way a loading overlay blocks the page.

use alloy_primitives::U256;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::contract::SupplyChain;
use crate::errors::{Result, TrackerError};
use crate::forms::{parse_uint, AddProductForm, AuthorityForm, CounterfeitForm, UpdateStatusForm};
use crate::session::{ConnectionManager, Session, Tab};
use crate::views::{
    HistoryEntryView, ProductCountView, ProductHistoryView, SessionView, TabView,
    VerificationView, WriteOutcome,
};

pub struct Dashboard {
    connector: ConnectionManager,
    session: RwLock<Option<Session>>,
    /// Independent of the wallet: survives reconnects and works before one.
    active_tab: RwLock<Tab>,
    write_gate: Mutex<()>,
}

impl Dashboard {
    pub fn new(connector: ConnectionManager) -> Self {
        Self {
            connector,
            session: RwLock::new(None),
            active_tab: RwLock::new(Tab::default()),
            write_gate: Mutex::new(()),
        }
    }

    pub async fn connect(&self) -> Result<SessionView> {
        let session = self.connector.connect().await?;
        let view = SessionView::new(&session, *self.active_tab.read().await);
        *self.session.write().await = Some(session);
        Ok(view)
    }

    /// Silently reconnect an account the wallet has already authorised.
    pub async fn restore(&self) -> Result<Option<SessionView>> {
        let Some(session) = self.connector.restore().await? else {
            return Ok(None);
        };
        let view = SessionView::new(&session, *self.active_tab.read().await);
        *self.session.write().await = Some(session);
        Ok(Some(view))
    }

    /// The current session, restoring one from the wallet if none exists yet.
    pub async fn session(&self) -> Result<SessionView> {
        if let Some(session) = self.session.read().await.as_ref() {
            return Ok(SessionView::new(session, *self.active_tab.read().await));
        }
        match self.restore().await {
            Ok(Some(view)) => Ok(view),
            Ok(None) => Err(TrackerError::NotConnected),
            Err(e) => {
                warn!("Could not restore wallet session: {e}");
                Err(TrackerError::NotConnected)
            }
        }
    }

    pub async fn switch_tab(&self, tab: Tab) -> TabView {
        *self.active_tab.write().await = tab;
        TabView { active_tab: tab }
    }

    async fn contract(&self) -> Result<SupplyChain> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.contract.clone())
            .ok_or(TrackerError::NotConnected)
    }

    // ─── Writes ───────────────────────────────────────────

    pub async fn add_product(&self, form: &AddProductForm) -> Result<WriteOutcome> {
        let contract = self.contract().await?;
        let product = form.validate()?;
        let _pending = self.write_gate.try_lock().map_err(|_| TrackerError::Busy)?;

        let name = product.name.clone();
        let receipt = contract.add_product(product).await?;
        let mut outcome =
            WriteOutcome::confirmed("Product added successfully!", receipt.transaction_hash);
        outcome.product_id = contract.added_product_id(&receipt).map(|id| id.to_string());

        // The write is already mined; a failed refresh only loses the counter.
        match contract.product_count().await {
            Ok(count) => outcome.product_count = Some(count.to_string()),
            Err(e) => warn!("Could not refresh product count: {e}"),
        }

        info!(product = %name, id = ?outcome.product_id, "Product added");
        Ok(outcome)
    }

    pub async fn update_status(
        &self,
        product_id: &str,
        form: &UpdateStatusForm,
    ) -> Result<WriteOutcome> {
        let contract = self.contract().await?;
        let change = form.validate(product_id)?;
        let _pending = self.write_gate.try_lock().map_err(|_| TrackerError::Busy)?;

        let status = change.status;
        let receipt = contract.update_status(change).await?;
        info!(product_id, status = status.display_name(), "Status updated");
        Ok(WriteOutcome::confirmed(
            format!("Status updated to {}!", status.display_name()),
            receipt.transaction_hash,
        ))
    }

    pub async fn authorize_manufacturer(&self, form: &AuthorityForm) -> Result<WriteOutcome> {
        let contract = self.contract().await?;
        let manufacturer = form.validate()?;
        let _pending = self.write_gate.try_lock().map_err(|_| TrackerError::Busy)?;

        let receipt = contract.authorize_manufacturer(manufacturer).await?;
        Ok(WriteOutcome::confirmed(
            format!("Manufacturer {manufacturer} authorized!"),
            receipt.transaction_hash,
        ))
    }

    pub async fn authorize_logistics(&self, form: &AuthorityForm) -> Result<WriteOutcome> {
        let contract = self.contract().await?;
        let logistics = form.validate()?;
        let _pending = self.write_gate.try_lock().map_err(|_| TrackerError::Busy)?;

        let receipt = contract.authorize_logistics(logistics).await?;
        Ok(WriteOutcome::confirmed(
            format!("Logistics provider {logistics} authorized!"),
            receipt.transaction_hash,
        ))
    }

    pub async fn mark_as_counterfeit(&self, form: &CounterfeitForm) -> Result<WriteOutcome> {
        let contract = self.contract().await?;
        let product_id = form.validate()?;
        let _pending = self.write_gate.try_lock().map_err(|_| TrackerError::Busy)?;

        let receipt = contract.mark_as_counterfeit(product_id).await?;
        warn!(%product_id, "Product marked as counterfeit");
        Ok(WriteOutcome::confirmed(
            format!("Product #{product_id} marked as counterfeit"),
            receipt.transaction_hash,
        ))
    }

    // ─── Reads ────────────────────────────────────────────

    pub async fn verify(&self, product_id: &str) -> Result<VerificationView> {
        let contract = self.contract().await?;
        let id = parse_uint("Product ID", product_id)?;
        let verification = contract.verify_authenticity(id).await?;
        Ok(VerificationView::new(id, verification))
    }

    pub async fn history(&self, product_id: &str) -> Result<ProductHistoryView> {
        let contract = self.contract().await?;
        let id: U256 = parse_uint("Product ID", product_id)?;
        let history: Vec<HistoryEntryView> = contract
            .product_history(id)
            .await?
            .into_iter()
            .map(HistoryEntryView::from)
            .collect();
        Ok(ProductHistoryView {
            product_id: id.to_string(),
            count: history.len(),
            history,
        })
    }

    pub async fn product_count(&self) -> Result<ProductCountView> {
        let contract = self.contract().await?;
        Ok(ProductCountView {
            product_count: contract.product_count().await?.to_string(),
        })
    }
}
