//! Cart API Handlers
//!
//! The cart is always presented as a resolved view: line items joined
//! against live products, inactive listings hidden, totals recomputed from
//! scratch on every read and mutation. Prices freeze only at checkout.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::orders::types::{ShippingAddressRequest, parse_payment_method};
use crate::api::{AppJson, AppPath};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{CartView, OrderWithItems};
use crate::db::repository::order::{OrderDraft, OrderItemDraft};
use crate::db::repository::{cart, order, product};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult};

/// Resolved view of the user's cart, or the zero-valued virtual cart when
/// none exists yet.
async fn view_of(state: &ServerState, user_id: i64) -> AppResult<CartView> {
    match cart::find_by_user(&state.pool, user_id).await? {
        Some(c) => {
            let items = cart::resolved_items(&state.pool, c.id).await?;
            Ok(CartView::resolve(user_id, items))
        }
        None => Ok(CartView::empty(user_id)),
    }
}

/// GET /api/cart - 获取购物车 (读操作不创建任何行)
pub async fn get_cart(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<CartView>> {
    Ok(Json(view_of(&state, current_user.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

/// POST /api/cart/add - 加入购物车
///
/// 同一商品的重复加入累加数量。卖家不能购买自己的商品。
pub async fn add_item(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppJson(req): AppJson<AddItemRequest>,
) -> AppResult<Json<CartView>> {
    if req.quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }

    let listing = product::find_by_id(&state.pool, req.product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::not_found("Product not found or unavailable"))?;

    if listing.seller_id == current_user.id {
        return Err(AppError::validation("Cannot add your own product to cart"));
    }

    let c = cart::ensure_cart(&state.pool, current_user.id).await?;
    cart::add_item(&state.pool, c.id, req.product_id, req.quantity).await?;

    Ok(Json(view_of(&state, current_user.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

/// PUT /api/cart/update/:item_id - 修改数量
pub async fn update_item(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppPath(item_id): AppPath<i64>,
    AppJson(req): AppJson<UpdateItemRequest>,
) -> AppResult<Json<CartView>> {
    if req.quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }

    let c = cart::find_by_user(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    if !cart::update_item_quantity(&state.pool, c.id, item_id, req.quantity).await? {
        return Err(AppError::not_found("Item not found in cart"));
    }

    Ok(Json(view_of(&state, current_user.id).await?))
}

/// DELETE /api/cart/remove/:item_id - 移除条目
pub async fn remove_item(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppPath(item_id): AppPath<i64>,
) -> AppResult<Json<CartView>> {
    let c = cart::find_by_user(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    if !cart::remove_item(&state.pool, c.id, item_id).await? {
        return Err(AppError::not_found("Item not found in cart"));
    }

    Ok(Json(view_of(&state, current_user.id).await?))
}

#[derive(Debug, Serialize)]
pub struct ClearCartResponse {
    pub message: String,
}

/// DELETE /api/cart/clear - 清空购物车
pub async fn clear_cart(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<ClearCartResponse>> {
    let c = cart::find_by_user(&state.pool, current_user.id)
        .await?
        .ok_or_else(|| AppError::not_found("Cart not found"))?;

    cart::clear(&state.pool, c.id).await?;

    Ok(Json(ClearCartResponse {
        message: "Cart cleared successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: ShippingAddressRequest,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub message: String,
    pub order: OrderWithItems,
}

/// POST /api/cart/checkout - 结算
///
/// 订单创建和清空购物车在同一个事务中提交：要么两者都生效，要么
/// 都不生效。价格/碳减排快照取自事务内读到的商品行。
pub async fn checkout(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppJson(req): AppJson<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    let shipping_address = req.shipping_address.validate_into()?;
    let payment_method = parse_payment_method(req.payment_method.as_deref())?;
    let notes = req.notes.unwrap_or_default();
    validate_optional_text(&Some(notes.clone()), "notes", MAX_NOTE_LEN)?;

    let c = cart::find_by_user(&state.pool, current_user.id).await?;
    let items = match &c {
        Some(c) => cart::resolved_items(&state.pool, c.id).await?,
        None => Vec::new(),
    };

    if items.is_empty() {
        return Err(AppError::validation("Cart is empty"));
    }

    // Every resolved line must still be purchasable; name the ones that
    // are not. The cart is left untouched on this path.
    let unavailable: Vec<&str> = items
        .iter()
        .filter(|i| !i.is_active)
        .map(|i| i.title.as_str())
        .collect();
    if !unavailable.is_empty() {
        return Err(AppError::validation(format!(
            "Some items are no longer available: {}",
            unavailable.join(", ")
        )));
    }

    let drafts: Vec<OrderItemDraft> = items
        .iter()
        .map(|i| OrderItemDraft {
            product_id: i.product_id,
            quantity: i.quantity,
            price: i.price,
            co2_saved: i.co2_saved,
        })
        .collect();

    let cart_id = c.map(|c| c.id);
    let created = order::create(
        &state.pool,
        OrderDraft {
            buyer_id: current_user.id,
            items: drafts,
            shipping_address,
            payment_method,
            notes,
        },
        cart_id,
    )
    .await?;

    let items = order::items_of(&state.pool, created.id).await?;

    tracing::info!(
        order_id = %created.id,
        order_number = %created.order_number,
        buyer_id = %current_user.id,
        total = created.total_amount,
        "Checkout completed"
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            message: "Checkout successful".to_string(),
            order: OrderWithItems {
                order: created,
                items,
            },
        }),
    ))
}
