//! Order Repository
//!
//! Order creation is the one multi-statement transaction in the system:
//! sequence bump, order row, frozen line items and the cart clear all
//! commit together or not at all.

use super::{RepoError, RepoResult};
use crate::db::models::{
    Order, OrderItemDetail, OrderStatus, PaymentMethod, ShippingAddress,
};
use crate::utils::{now_millis, snowflake_id};
use serde::Serialize;
use sqlx::SqlitePool;

/// Frozen line item going into a new order. Price and CO₂ are snapshots
/// taken from the product at creation time.
#[derive(Debug, Clone)]
pub struct OrderItemDraft {
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
    pub co2_saved: f64,
}

/// Everything needed to persist a new order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub buyer_id: i64,
    pub items: Vec<OrderItemDraft>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub notes: String,
}

/// Create an order with status `pending`. When `clear_cart` carries a cart
/// id, its items are removed in the same transaction — a crash between
/// order insert and cart clear cannot lose or duplicate the purchase.
///
/// The order number is `ECO-<millis>-<seq>` where `seq` comes from the
/// single-row `order_counter`, bumped inside this transaction so two
/// concurrent checkouts can never observe the same value.
pub async fn create(
    pool: &SqlitePool,
    draft: OrderDraft,
    clear_cart: Option<i64>,
) -> RepoResult<Order> {
    if draft.items.is_empty() {
        return Err(RepoError::Validation("order must contain items".into()));
    }

    let id = snowflake_id();
    let now = now_millis();

    let total_amount: f64 = draft
        .items
        .iter()
        .map(|i| i.price * i.quantity as f64)
        .sum();
    let total_co2_saved: f64 = draft
        .items
        .iter()
        .map(|i| i.co2_saved * i.quantity as f64)
        .sum();

    let mut tx = pool.begin().await?;

    let seq: i64 =
        sqlx::query_scalar("UPDATE order_counter SET value = value + 1 WHERE id = 1 RETURNING value")
            .fetch_one(&mut *tx)
            .await?;
    let order_number = format!("ECO-{now}-{seq:04}");

    sqlx::query(
        "INSERT INTO orders (id, order_number, buyer_id, total_amount, total_co2_saved, \
         status, ship_street, ship_city, ship_state, ship_zip, ship_country, \
         payment_method, notes, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&order_number)
    .bind(draft.buyer_id)
    .bind(total_amount)
    .bind(total_co2_saved)
    .bind(OrderStatus::Pending)
    .bind(&draft.shipping_address.street)
    .bind(&draft.shipping_address.city)
    .bind(&draft.shipping_address.state)
    .bind(&draft.shipping_address.zip_code)
    .bind(&draft.shipping_address.country)
    .bind(draft.payment_method)
    .bind(&draft.notes)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    for item in &draft.items {
        sqlx::query(
            "INSERT INTO order_item (order_id, product_id, quantity, price, co2_saved) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .bind(item.co2_saved)
        .execute(&mut *tx)
        .await?;
    }

    if let Some(cart_id) = clear_cart {
        sqlx::query("DELETE FROM cart_item WHERE cart_id = ?")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create order".into()))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(order)
}

/// Line items with the referenced product's descriptive fields. Inactive
/// products still resolve — history must survive delisting.
pub async fn items_of(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItemDetail>> {
    let items = sqlx::query_as::<_, OrderItemDetail>(
        "SELECT oi.id, oi.product_id, oi.quantity, oi.price, oi.co2_saved, \
                p.title, p.images, p.category, p.condition, p.seller_id \
         FROM order_item oi JOIN product p ON p.id = oi.product_id \
         WHERE oi.order_id = ? ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Buyer's order history, newest first.
pub async fn find_by_buyer(
    pool: &SqlitePool,
    buyer_id: i64,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Order>, i64)> {
    let (orders, total) = if let Some(status) = status {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE buyer_id = ? AND status = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(buyer_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = ? AND status = ?")
                .bind(buyer_id)
                .bind(status)
                .fetch_one(pool)
                .await?;
        (orders, total)
    } else {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE buyer_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?",
        )
        .bind(buyer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = ?")
            .bind(buyer_id)
            .fetch_one(pool)
            .await?;
        (orders, total)
    };
    Ok((orders, total))
}

/// Orders containing at least one product sold by `seller_id`.
pub async fn find_containing_seller(
    pool: &SqlitePool,
    seller_id: i64,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Order>, i64)> {
    let exists = "EXISTS (SELECT 1 FROM order_item oi JOIN product p ON p.id = oi.product_id \
                  WHERE oi.order_id = orders.id AND p.seller_id = ?)";

    let (orders, total) = if let Some(status) = status {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT * FROM orders WHERE {exists} AND status = ? \
             ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(seller_id)
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM orders WHERE {exists} AND status = ?"
        ))
        .bind(seller_id)
        .bind(status)
        .fetch_one(pool)
        .await?;
        (orders, total)
    } else {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT * FROM orders WHERE {exists} ORDER BY created_at DESC LIMIT ? OFFSET ?"
        ))
        .bind(seller_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders WHERE {exists}"))
                .bind(seller_id)
                .fetch_one(pool)
                .await?;
        (orders, total)
    };
    Ok((orders, total))
}

/// Whether the user sells at least one product contained in the order —
/// the authorization gate for status updates.
pub async fn seller_in_order(pool: &SqlitePool, order_id: i64, user_id: i64) -> RepoResult<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM order_item oi JOIN product p ON p.id = oi.product_id \
         WHERE oi.order_id = ? AND p.seller_id = ?",
    )
    .bind(order_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

pub async fn update_status(pool: &SqlitePool, id: i64, status: OrderStatus) -> RepoResult<()> {
    let rows = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Order {id} not found")));
    }
    Ok(())
}

/// Buyer-side purchase aggregates
#[derive(Debug, Clone, Serialize)]
pub struct BuyerStats {
    pub total_orders: i64,
    pub total_spent: f64,
    pub total_co2_saved: f64,
    pub total_items: i64,
}

/// Seller-side sales aggregates (over the seller's own line items only)
#[derive(Debug, Clone, Serialize)]
pub struct SellerStats {
    pub total_sales: i64,
    pub total_revenue: f64,
    pub total_co2_saved: f64,
}

pub async fn buyer_stats(pool: &SqlitePool, buyer_id: i64) -> RepoResult<BuyerStats> {
    let (total_orders, total_spent, total_co2_saved): (i64, f64, f64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(total_amount), 0.0), COALESCE(SUM(total_co2_saved), 0.0) \
         FROM orders WHERE buyer_id = ?",
    )
    .bind(buyer_id)
    .fetch_one(pool)
    .await?;

    let total_items: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(oi.quantity), 0) FROM order_item oi \
         JOIN orders o ON o.id = oi.order_id WHERE o.buyer_id = ?",
    )
    .bind(buyer_id)
    .fetch_one(pool)
    .await?;

    Ok(BuyerStats {
        total_orders,
        total_spent,
        total_co2_saved,
        total_items,
    })
}

pub async fn seller_stats(pool: &SqlitePool, seller_id: i64) -> RepoResult<SellerStats> {
    let (total_sales, total_revenue, total_co2_saved): (i64, f64, f64) = sqlx::query_as(
        "SELECT COUNT(DISTINCT oi.order_id), \
                COALESCE(SUM(oi.price * oi.quantity), 0.0), \
                COALESCE(SUM(oi.co2_saved * oi.quantity), 0.0) \
         FROM order_item oi JOIN product p ON p.id = oi.product_id \
         WHERE p.seller_id = ?",
    )
    .bind(seller_id)
    .fetch_one(pool)
    .await?;

    Ok(SellerStats {
        total_sales,
        total_revenue,
        total_co2_saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Category, Condition, Location, ProductCreate, UserCreate};
    use crate::db::repository::{cart, product, test_support::test_pool, user};

    async fn seed_user(pool: &SqlitePool, name: &str) -> i64 {
        user::create(
            pool,
            UserCreate {
                username: name.into(),
                email: format!("{name}@x.com"),
                password_hash: "$argon2id$fake".into(),
                full_name: name.into(),
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn seed_product(pool: &SqlitePool, seller: i64, price: f64, co2: f64) -> i64 {
        product::create(
            pool,
            seller,
            ProductCreate {
                title: "Desk".into(),
                description: "A desk".into(),
                price,
                category: Category::Home,
                condition: Condition::Good,
                images: vec![],
                co2_saved: co2,
                location: Location::default(),
                tags: vec![],
            },
        )
        .await
        .unwrap()
        .id
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62701".into(),
            country: "US".into(),
        }
    }

    fn draft(buyer: i64, items: Vec<OrderItemDraft>) -> OrderDraft {
        OrderDraft {
            buyer_id: buyer,
            items,
            shipping_address: address(),
            payment_method: PaymentMethod::CreditCard,
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn create_freezes_totals_and_clears_cart_atomically() {
        let pool = test_pool().await;
        let seller = seed_user(&pool, "sam").await;
        let buyer = seed_user(&pool, "bob").await;
        let product_id = seed_product(&pool, seller, 20.0, 2.0).await;

        let c = cart::ensure_cart(&pool, buyer).await.unwrap();
        cart::add_item(&pool, c.id, product_id, 3).await.unwrap();

        let order = create(
            &pool,
            draft(
                buyer,
                vec![OrderItemDraft {
                    product_id,
                    quantity: 3,
                    price: 20.0,
                    co2_saved: 2.0,
                }],
            ),
            Some(c.id),
        )
        .await
        .unwrap();

        assert_eq!(order.status, OrderStatus::Pending);
        assert!((order.total_amount - 60.0).abs() < 1e-9);
        assert!((order.total_co2_saved - 6.0).abs() < 1e-9);
        assert!(order.order_number.starts_with("ECO-"));
        assert!(cart::resolved_items(&pool, c.id).await.unwrap().is_empty());

        // Snapshot survives later product edits.
        product::update(
            &pool,
            product_id,
            crate::db::models::ProductUpdate {
                price: Some(999.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let items = items_of(&pool, order.id).await.unwrap();
        assert!((items[0].price - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn order_numbers_use_distinct_sequence_values() {
        let pool = test_pool().await;
        let seller = seed_user(&pool, "sam").await;
        let buyer = seed_user(&pool, "bob").await;
        let product_id = seed_product(&pool, seller, 10.0, 0.0).await;

        let item = OrderItemDraft {
            product_id,
            quantity: 1,
            price: 10.0,
            co2_saved: 0.0,
        };
        let o1 = create(&pool, draft(buyer, vec![item.clone()]), None)
            .await
            .unwrap();
        let o2 = create(&pool, draft(buyer, vec![item]), None).await.unwrap();

        assert_ne!(o1.order_number, o2.order_number);
        assert!(o1.order_number.ends_with("0001"));
        assert!(o2.order_number.ends_with("0002"));
    }

    #[tokio::test]
    async fn empty_item_list_is_rejected() {
        let pool = test_pool().await;
        let buyer = seed_user(&pool, "bob").await;
        let err = create(&pool, draft(buyer, vec![]), None).await.unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
    }

    #[tokio::test]
    async fn buyer_history_filters_by_status() {
        let pool = test_pool().await;
        let seller = seed_user(&pool, "sam").await;
        let buyer = seed_user(&pool, "bob").await;
        let product_id = seed_product(&pool, seller, 10.0, 1.0).await;

        let item = OrderItemDraft {
            product_id,
            quantity: 1,
            price: 10.0,
            co2_saved: 1.0,
        };
        let o1 = create(&pool, draft(buyer, vec![item.clone()]), None)
            .await
            .unwrap();
        create(&pool, draft(buyer, vec![item]), None).await.unwrap();
        update_status(&pool, o1.id, OrderStatus::Confirmed).await.unwrap();

        let (all, total) = find_by_buyer(&pool, buyer, None, 10, 0).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let (confirmed, total) =
            find_by_buyer(&pool, buyer, Some(OrderStatus::Confirmed), 10, 0)
                .await
                .unwrap();
        assert_eq!(total, 1);
        assert_eq!(confirmed[0].id, o1.id);
    }

    #[tokio::test]
    async fn seller_scoping_and_stats() {
        let pool = test_pool().await;
        let sam = seed_user(&pool, "sam").await;
        let sue = seed_user(&pool, "sue").await;
        let buyer = seed_user(&pool, "bob").await;
        let sam_product = seed_product(&pool, sam, 20.0, 2.0).await;
        let sue_product = seed_product(&pool, sue, 7.0, 0.5).await;

        let order = create(
            &pool,
            draft(
                buyer,
                vec![
                    OrderItemDraft {
                        product_id: sam_product,
                        quantity: 2,
                        price: 20.0,
                        co2_saved: 2.0,
                    },
                    OrderItemDraft {
                        product_id: sue_product,
                        quantity: 1,
                        price: 7.0,
                        co2_saved: 0.5,
                    },
                ],
            ),
            None,
        )
        .await
        .unwrap();

        assert!(seller_in_order(&pool, order.id, sam).await.unwrap());
        assert!(seller_in_order(&pool, order.id, sue).await.unwrap());
        assert!(!seller_in_order(&pool, order.id, buyer).await.unwrap());

        let (sam_orders, total) = find_containing_seller(&pool, sam, None, 10, 0)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(sam_orders[0].id, order.id);

        // Seller revenue covers only the seller's own lines.
        let stats = seller_stats(&pool, sam).await.unwrap();
        assert_eq!(stats.total_sales, 1);
        assert!((stats.total_revenue - 40.0).abs() < 1e-9);

        let buyer_side = buyer_stats(&pool, buyer).await.unwrap();
        assert_eq!(buyer_side.total_orders, 1);
        assert_eq!(buyer_side.total_items, 3);
        assert!((buyer_side.total_spent - 47.0).abs() < 1e-9);
    }
}
