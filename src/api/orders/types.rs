//! Shared order-entry payloads, used by both the checkout path and the
//! direct order-creation endpoint.

use serde::Deserialize;

use crate::db::models::{PaymentMethod, ShippingAddress};
use crate::utils::validation::{MAX_SHORT_TEXT_LEN, validate_optional_text, validate_required_text};
use crate::utils::{AppError, AppResult};

/// Incoming shipping address; country defaults to US.
#[derive(Debug, Deserialize)]
pub struct ShippingAddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub country: Option<String>,
}

impl ShippingAddressRequest {
    pub fn validate_into(self) -> AppResult<ShippingAddress> {
        validate_required_text(&self.street, "street", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&self.city, "city", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&self.state, "state", MAX_SHORT_TEXT_LEN)?;
        validate_required_text(&self.zip_code, "zip_code", MAX_SHORT_TEXT_LEN)?;
        validate_optional_text(&self.country, "country", MAX_SHORT_TEXT_LEN)?;
        Ok(ShippingAddress {
            street: self.street,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            country: self
                .country
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "US".to_string()),
        })
    }
}

/// Enum values arrive as plain strings so bad input maps to a 400 with a
/// helpful message instead of a deserializer rejection.
pub fn parse_payment_method(raw: Option<&str>) -> AppResult<PaymentMethod> {
    match raw {
        None => Ok(PaymentMethod::default()),
        Some(raw) => raw.parse::<PaymentMethod>().map_err(|_| {
            AppError::validation(
                "payment_method must be one of: credit_card, debit_card, paypal, cash_on_delivery",
            )
        }),
    }
}
