//! Form payloads and their validation into typed contract arguments.
//!
//! Fields arrive as strings, the way an HTML form submits them; every field
//! defaults to empty so a missing field reports the same "required" message
//! as a blank one.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::Deserialize;

use crate::errors::{Result, TrackerError};
use crate::status::ProductStatus;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddProductForm {
    pub name: String,
    pub description: String,
    pub manufacturing_location: String,
    pub price: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateStatusForm {
    pub status: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthorityForm {
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CounterfeitForm {
    pub product_id: String,
}

/// Arguments of `addProduct`, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub manufacturing_location: String,
    pub price: U256,
}

/// Arguments of `updateStatus`, in declared order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub product_id: U256,
    pub status: ProductStatus,
    pub location: String,
    pub notes: String,
}

impl AddProductForm {
    pub fn validate(&self) -> Result<NewProduct> {
        Ok(NewProduct {
            name: required("Product name", &self.name)?,
            description: required("Description", &self.description)?,
            manufacturing_location: required("Manufacturing location", &self.manufacturing_location)?,
            price: parse_uint("Price", &self.price)?,
        })
    }
}

impl UpdateStatusForm {
    pub fn validate(&self, product_id: &str) -> Result<StatusChange> {
        let product_id = parse_uint("Product ID", product_id)?;
        let code = required("Status", &self.status)?;
        let status = code
            .parse::<u8>()
            .ok()
            .and_then(ProductStatus::from_code)
            .ok_or_else(|| TrackerError::InvalidInput(format!("Invalid status: {code}")))?;

        Ok(StatusChange {
            product_id,
            status,
            location: required("Location", &self.location)?,
            notes: self.notes.trim().to_string(),
        })
    }
}

impl AuthorityForm {
    pub fn validate(&self) -> Result<Address> {
        parse_address("Address", &self.address)
    }
}

impl CounterfeitForm {
    pub fn validate(&self) -> Result<U256> {
        parse_uint("Product ID", &self.product_id)
    }
}

fn required(field: &str, raw: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(TrackerError::InvalidInput(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Non-negative decimal integer that fits a `uint256`.
pub fn parse_uint(field: &str, raw: &str) -> Result<U256> {
    let value = required(field, raw)?;
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TrackerError::InvalidInput(format!(
            "{field} must be a whole number"
        )));
    }
    U256::from_str_radix(&value, 10)
        .map_err(|_| TrackerError::InvalidInput(format!("{field} is out of range")))
}

pub fn parse_address(field: &str, raw: &str) -> Result<Address> {
    let value = required(field, raw)?;
    if !value.starts_with("0x") || value.len() != 42 {
        return Err(TrackerError::InvalidInput(format!(
            "{field} must be a 0x-prefixed 20-byte hex address"
        )));
    }
    Address::from_str(&value)
        .map_err(|_| TrackerError::InvalidInput(format!("{field} is not a valid address")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product_form() -> AddProductForm {
        AddProductForm {
            name: " Widget ".into(),
            description: "Blue widget".into(),
            manufacturing_location: "Lyon".into(),
            price: "1500".into(),
        }
    }

    #[test]
    fn valid_product_form_is_trimmed() {
        let product = product_form().validate().unwrap();
        assert_eq!(product.name, "Widget");
        assert_eq!(product.price, U256::from(1500u64));
    }

    #[test]
    fn blank_fields_are_rejected() {
        let mut form = product_form();
        form.manufacturing_location = "   ".into();
        let err = form.validate().unwrap_err();
        assert_eq!(err.to_string(), "Manufacturing location is required");
    }

    #[test]
    fn malformed_price_is_rejected() {
        for price in ["-5", "1.5", "12abc", "0x10"] {
            let mut form = product_form();
            form.price = price.into();
            assert!(
                matches!(form.validate(), Err(TrackerError::InvalidInput(_))),
                "price {price} should be rejected"
            );
        }
    }

    #[test]
    fn status_form_requires_known_status() {
        let form = UpdateStatusForm {
            status: "4".into(),
            location: "Warehouse".into(),
            notes: String::new(),
        };
        assert!(form.validate("1").is_err());

        let form = UpdateStatusForm {
            status: "2".into(),
            ..form
        };
        let change = form.validate("1").unwrap();
        assert_eq!(change.status, ProductStatus::Delivered);
        assert_eq!(change.notes, "");
    }

    #[test]
    fn addresses_must_be_full_length() {
        let ok = AuthorityForm {
            address: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".into(),
        };
        assert!(ok.validate().is_ok());

        for bad in ["70997970C51812dc3A010C7d01b50e0d17dc79C8", "0x1234", "0xZZ97970C51812dc3A010C7d01b50e0d17dc79C8"] {
            let form = AuthorityForm {
                address: bad.into(),
            };
            assert!(form.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn missing_fields_deserialize_as_blank() {
        let form: CounterfeitForm = serde_json::from_str("{}").unwrap();
        assert_eq!(
            form.validate().unwrap_err().to_string(),
            "Product ID is required"
        );
    }
}
