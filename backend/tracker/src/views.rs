//! Rendered shapes returned to the front end.

use alloy_primitives::{Address, B256, U256};
use chrono::DateTime;
use serde::Serialize;

use crate::contract::{StatusUpdate, Verification};
use crate::notify::Notification;
use crate::session::{Session, Tab};
use crate::status::{status_class, status_name};

/// Unix seconds rendered as `YYYY-MM-DD HH:MM:SS UTC`.
pub fn format_timestamp(secs: U256) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "Invalid date".to_string())
}

#[derive(Debug, Serialize)]
pub struct StatusView {
    pub code: u8,
    pub name: &'static str,
    pub class: &'static str,
}

impl StatusView {
    pub fn from_code(code: u8) -> Self {
        Self {
            code,
            name: status_name(code),
            class: status_class(code),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub address: Address,
    pub is_owner: bool,
    pub active_tab: Tab,
    pub contract_address: Address,
}

impl SessionView {
    pub fn new(session: &Session, active_tab: Tab) -> Self {
        Self {
            address: session.address,
            is_owner: session.is_owner,
            active_tab,
            contract_address: session.contract.address(),
        }
    }
}

/// The front end's current tab; tracked with or without a wallet.
#[derive(Debug, Serialize)]
pub struct TabView {
    pub active_tab: Tab,
}

#[derive(Debug, Serialize)]
pub struct ProductDetails {
    pub name: String,
    pub manufacturer: Address,
    pub manufacturing_date: String,
    pub status: StatusView,
    pub current_location: String,
    pub current_owner: Address,
    pub price: String,
    pub total_updates: String,
}

#[derive(Debug, Serialize)]
pub struct VerificationView {
    pub product_id: String,
    pub authentic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductDetails>,
}

impl VerificationView {
    pub fn new(product_id: U256, verification: Option<Verification>) -> Self {
        let product_id = product_id.to_string();
        match verification {
            Some(v) if v.is_authentic => Self {
                product_id,
                authentic: true,
                product: Some(ProductDetails {
                    name: v.product_name,
                    manufacturer: v.manufacturer,
                    manufacturing_date: format_timestamp(v.manufacturing_date),
                    status: StatusView::from_code(v.current_status),
                    current_location: v.current_location,
                    current_owner: v.current_owner,
                    price: v.price.to_string(),
                    total_updates: v.total_updates.to_string(),
                }),
            },
            _ => Self {
                product_id,
                authentic: false,
                product: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryEntryView {
    pub timestamp: String,
    pub date: String,
    pub status: StatusView,
    pub location: String,
    pub updated_by: Address,
    pub notes: String,
}

impl From<StatusUpdate> for HistoryEntryView {
    fn from(update: StatusUpdate) -> Self {
        Self {
            timestamp: update.timestamp.to_string(),
            date: format_timestamp(update.timestamp),
            status: StatusView::from_code(update.status),
            location: update.location,
            updated_by: update.updated_by,
            notes: update.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductHistoryView {
    pub product_id: String,
    pub count: usize,
    pub history: Vec<HistoryEntryView>,
}

#[derive(Debug, Serialize)]
pub struct ProductCountView {
    pub product_count: String,
}

/// Result of a confirmed write.
#[derive(Debug, Serialize)]
pub struct WriteOutcome {
    #[serde(flatten)]
    pub notification: Notification,
    pub tx_hash: B256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_count: Option<String>,
}

impl WriteOutcome {
    pub fn confirmed(message: impl Into<String>, tx_hash: B256) -> Self {
        Self {
            notification: Notification::success(message),
            tx_hash,
            product_id: None,
            product_count: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verification(is_authentic: bool) -> Verification {
        Verification {
            is_authentic,
            product_name: "Widget".into(),
            manufacturer: Address::repeat_byte(1),
            manufacturing_date: U256::from(1_704_067_200u64),
            current_status: 1,
            current_location: "Rotterdam".into(),
            current_owner: Address::repeat_byte(2),
            price: U256::from(1500u64),
            total_updates: U256::from(2u64),
        }
    }

    #[test]
    fn timestamps_render_in_utc() {
        assert_eq!(
            format_timestamp(U256::from(1_704_067_200u64)),
            "2024-01-01 00:00:00 UTC"
        );
        assert_eq!(format_timestamp(U256::MAX), "Invalid date");
    }

    #[test]
    fn authentic_product_renders_details() {
        let view = VerificationView::new(U256::from(3u64), Some(verification(true)));
        assert!(view.authentic);
        let product = view.product.unwrap();
        assert_eq!(product.status.name, "In Transit");
        assert_eq!(product.status.class, "status-intransit");
        assert_eq!(product.manufacturing_date, "2024-01-01 00:00:00 UTC");
    }

    #[test]
    fn missing_or_flagged_product_is_inauthentic() {
        let missing = VerificationView::new(U256::from(99u64), None);
        assert!(!missing.authentic);
        assert!(missing.product.is_none());

        let flagged = VerificationView::new(U256::from(3u64), Some(verification(false)));
        assert!(!flagged.authentic);
        let json = serde_json::to_value(&flagged).unwrap();
        assert!(json.get("product").is_none());
    }

    #[test]
    fn write_outcome_flattens_notification() {
        let outcome = WriteOutcome::confirmed("Product added", B256::ZERO);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "success");
        assert_eq!(json["message"], "Product added");
        assert!(json.get("product_id").is_none());
    }
}
