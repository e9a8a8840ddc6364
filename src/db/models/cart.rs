//! Cart Model
//!
//! Carts never store totals: they are recomputed from the resolved line
//! items on every read and mutation, so the denormalized sums can never
//! drift from the items themselves.

use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::product::{Category, Condition};

/// Cart row — one per user, created lazily on first add
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Cart {
    pub id: i64,
    pub user_id: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Cart line item row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub added_at: i64,
}

/// Cart line item joined with its live product (price is NOT frozen here;
/// snapshots happen only at order creation).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ResolvedCartItem {
    pub id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub added_at: i64,
    pub title: String,
    pub price: f64,
    pub co2_saved: f64,
    pub images: Json<Vec<String>>,
    pub category: Category,
    pub condition: Condition,
    pub is_active: bool,
    pub seller_id: i64,
}

/// Derived totals over a resolved item set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CartTotals {
    pub total_items: i64,
    pub total_price: f64,
    pub total_co2_saved: f64,
}

/// What `GET /api/cart` returns: visible (active-product) items plus the
/// totals reduced over exactly those items.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub user_id: i64,
    pub items: Vec<ResolvedCartItem>,
    pub total_items: i64,
    pub total_price: f64,
    pub total_co2_saved: f64,
}

/// Pure reduction: totals = Σ (current product price × quantity) over the
/// given items. Callers pass only the items that should count (i.e. with
/// inactive products already filtered out).
pub fn totals_of(items: &[ResolvedCartItem]) -> CartTotals {
    let mut totals = CartTotals::default();
    for item in items {
        totals.total_items += item.quantity;
        totals.total_price += item.price * item.quantity as f64;
        totals.total_co2_saved += item.co2_saved * item.quantity as f64;
    }
    totals
}

impl CartView {
    /// Build the user-visible view: hide (not delete) lines whose product
    /// has been deactivated, recompute totals over the rest.
    pub fn resolve(user_id: i64, items: Vec<ResolvedCartItem>) -> Self {
        let items: Vec<ResolvedCartItem> =
            items.into_iter().filter(|i| i.is_active).collect();
        let totals = totals_of(&items);
        Self {
            user_id,
            items,
            total_items: totals.total_items,
            total_price: totals.total_price,
            total_co2_saved: totals.total_co2_saved,
        }
    }

    /// Zero-valued virtual cart for users who never added anything. No row
    /// is created for this.
    pub fn empty(user_id: i64) -> Self {
        Self {
            user_id,
            items: Vec::new(),
            total_items: 0,
            total_price: 0.0,
            total_co2_saved: 0.0,
        }
    }
}
