//! Cart Repository
//!
//! One cart per user (UNIQUE constraint), created lazily. Quantity
//! accumulation rides on the UNIQUE(cart_id, product_id) upsert so two
//! adds of the same product can never produce two lines.

use super::{RepoError, RepoResult};
use crate::db::models::{Cart, CartItem, ResolvedCartItem};
use crate::utils::{now_millis, snowflake_id};
use sqlx::SqlitePool;

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>("SELECT * FROM cart WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(cart)
}

/// Get the user's cart, creating it on first use. INSERT OR IGNORE keeps
/// this idempotent under the unique user constraint.
pub async fn ensure_cart(pool: &SqlitePool, user_id: i64) -> RepoResult<Cart> {
    let now = now_millis();
    sqlx::query(
        "INSERT OR IGNORE INTO cart (id, user_id, created_at, updated_at) VALUES (?, ?, ?, ?)",
    )
    .bind(snowflake_id())
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_user(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to ensure cart".into()))
}

/// Add a product to the cart; an existing line for the same product has
/// its quantity increased instead.
pub async fn add_item(
    pool: &SqlitePool,
    cart_id: i64,
    product_id: i64,
    quantity: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO cart_item (cart_id, product_id, quantity, added_at) \
         VALUES (?, ?, ?, ?) \
         ON CONFLICT (cart_id, product_id) \
         DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .bind(now_millis())
    .execute(pool)
    .await?;

    touch(pool, cart_id).await
}

pub async fn find_item(
    pool: &SqlitePool,
    cart_id: i64,
    item_id: i64,
) -> RepoResult<Option<CartItem>> {
    let item =
        sqlx::query_as::<_, CartItem>("SELECT * FROM cart_item WHERE id = ? AND cart_id = ?")
            .bind(item_id)
            .bind(cart_id)
            .fetch_optional(pool)
            .await?;
    Ok(item)
}

pub async fn update_item_quantity(
    pool: &SqlitePool,
    cart_id: i64,
    item_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE cart_item SET quantity = ? WHERE id = ? AND cart_id = ?")
        .bind(quantity)
        .bind(item_id)
        .bind(cart_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 1 {
        touch(pool, cart_id).await?;
        return Ok(true);
    }
    Ok(false)
}

pub async fn remove_item(pool: &SqlitePool, cart_id: i64, item_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE id = ? AND cart_id = ?")
        .bind(item_id)
        .bind(cart_id)
        .execute(pool)
        .await?;
    if rows.rows_affected() == 1 {
        touch(pool, cart_id).await?;
        return Ok(true);
    }
    Ok(false)
}

/// Empty the cart's items; the cart row itself stays.
pub async fn clear(pool: &SqlitePool, cart_id: i64) -> RepoResult<()> {
    sqlx::query("DELETE FROM cart_item WHERE cart_id = ?")
        .bind(cart_id)
        .execute(pool)
        .await?;
    touch(pool, cart_id).await
}

/// Line items joined against live products. Inactive products are kept in
/// the result (flagged) so callers decide whether to hide them (view) or
/// refuse them (checkout).
pub async fn resolved_items(
    pool: &SqlitePool,
    cart_id: i64,
) -> RepoResult<Vec<ResolvedCartItem>> {
    let items = sqlx::query_as::<_, ResolvedCartItem>(
        "SELECT ci.id, ci.product_id, ci.quantity, ci.added_at, \
                p.title, p.price, p.co2_saved, p.images, p.category, p.condition, \
                p.is_active, p.seller_id \
         FROM cart_item ci JOIN product p ON p.id = ci.product_id \
         WHERE ci.cart_id = ? ORDER BY ci.added_at, ci.id",
    )
    .bind(cart_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

async fn touch(pool: &SqlitePool, cart_id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE cart SET updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(cart_id)
        .execute(pool)
        .await?;
    Ok(())
}
