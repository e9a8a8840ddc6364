//! Order Model
//!
//! Orders are immutable once created except for `status`. Line items carry
//! price/CO₂ snapshots copied at checkout time so later product edits never
//! rewrite purchase history.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::str::FromStr;

use super::product::{Category, Condition, default_country};

/// 订单状态生命周期: pending → confirmed → shipped → delivered / cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Forward-only transitions; cancel allowed from any non-terminal state.
    /// Delivered and cancelled are terminal.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Confirmed) => true,
            (Confirmed, Shipped) => true,
            (Shipped, Delivered) => true,
            (Pending | Confirmed | Shipped, Cancelled) => true,
            _ => false,
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// 支付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Paypal,
    CashOnDelivery,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::CreditCard
    }
}

impl FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit_card" => Ok(PaymentMethod::CreditCard),
            "debit_card" => Ok(PaymentMethod::DebitCard),
            "paypal" => Ok(PaymentMethod::Paypal),
            "cash_on_delivery" => Ok(PaymentMethod::CashOnDelivery),
            _ => Err(()),
        }
    }
}

/// Shipping address, stored as flat columns on the order row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShippingAddress {
    #[sqlx(rename = "ship_street")]
    pub street: String,
    #[sqlx(rename = "ship_city")]
    pub city: String,
    #[sqlx(rename = "ship_state")]
    pub state: String,
    #[sqlx(rename = "ship_zip")]
    pub zip_code: String,
    #[sqlx(rename = "ship_country")]
    #[serde(default = "default_country")]
    pub country: String,
}

/// Order row matching the `orders` table
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub buyer_id: i64,
    pub total_amount: f64,
    pub total_co2_saved: f64,
    pub status: OrderStatus,
    #[sqlx(flatten)]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Frozen order line item
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
    pub co2_saved: f64,
}

/// Order line item joined with the (possibly since-deactivated) product's
/// descriptive fields, for history views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
    pub co2_saved: f64,
    pub title: String,
    pub images: Json<Vec<String>>,
    pub category: Category,
    pub condition: Condition,
    pub seller_id: i64,
}

/// Order plus its resolved line items — the API response shape
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_transitions_allowed() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Delivered));
    }

    #[test]
    fn cancel_only_from_non_terminal() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn no_skipping_or_rewinding() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
        assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn status_parses_wire_values() {
        assert_eq!("pending".parse::<OrderStatus>(), Ok(OrderStatus::Pending));
        assert!("Pending".parse::<OrderStatus>().is_err());
        assert_eq!(
            "cash_on_delivery".parse::<PaymentMethod>(),
            Ok(PaymentMethod::CashOnDelivery)
        );
    }
}
