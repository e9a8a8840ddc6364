//! Order API Handlers
//!
//! Buyers see their own history; sellers see orders containing their
//! listings and may advance those orders' status. An order never changes
//! after creation except for its status.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::orders::types::{ShippingAddressRequest, parse_payment_method};
use crate::api::{AppJson, AppPath, AppQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{OrderStatus, OrderWithItems};
use crate::db::repository::order::{self, BuyerStats, OrderDraft, OrderItemDraft, SellerStats};
use crate::db::repository::product;
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{AppError, AppResult, PageQuery, Pagination};

/// Query params for order listings
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl OrderListQuery {
    fn page_query(&self) -> PageQuery {
        let mut page = PageQuery::default();
        if let Some(p) = self.page {
            page.page = p;
        }
        if let Some(l) = self.limit {
            page.limit = l;
        }
        page
    }

    fn status_filter(&self) -> AppResult<Option<OrderStatus>> {
        match self.status.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<OrderStatus>()
                .map(Some)
                .map_err(|_| AppError::validation(valid_status_message())),
        }
    }
}

fn valid_status_message() -> &'static str {
    "status must be one of: pending, confirmed, shipped, delivered, cancelled"
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderWithItems>,
    pub pagination: Pagination,
}

async fn with_items(
    state: &ServerState,
    orders: Vec<crate::db::models::Order>,
) -> AppResult<Vec<OrderWithItems>> {
    let mut result = Vec::with_capacity(orders.len());
    for order_row in orders {
        let items = order::items_of(&state.pool, order_row.id).await?;
        result.push(OrderWithItems {
            order: order_row,
            items,
        });
    }
    Ok(result)
}

/// GET /api/orders - 买家订单历史 (可按状态过滤)
pub async fn list(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let status = query.status_filter()?;
    let page = query.page_query();
    let (_, limit) = page.clamped();

    let (orders, total) =
        order::find_by_buyer(&state.pool, current_user.id, status, limit, page.offset()).await?;

    Ok(Json(OrderListResponse {
        orders: with_items(&state, orders).await?,
        pagination: Pagination::new(&page, total),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub buyer: BuyerStats,
    pub seller: SellerStats,
}

/// GET /api/orders/stats - 买卖双向统计
pub async fn stats(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<StatsResponse>> {
    let buyer = order::buyer_stats(&state.pool, current_user.id).await?;
    let seller = order::seller_stats(&state.pool, current_user.id).await?;
    Ok(Json(StatsResponse { buyer, seller }))
}

/// GET /api/orders/seller/orders - 含本人商品的订单
pub async fn seller_orders(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppQuery(query): AppQuery<OrderListQuery>,
) -> AppResult<Json<OrderListResponse>> {
    let status = query.status_filter()?;
    let page = query.page_query();
    let (_, limit) = page.clamped();

    let (orders, total) = order::find_containing_seller(
        &state.pool,
        current_user.id,
        status,
        limit,
        page.offset(),
    )
    .await?;

    Ok(Json(OrderListResponse {
        orders: with_items(&state, orders).await?,
        pagination: Pagination::new(&page, total),
    }))
}

/// GET /api/orders/:id - 订单详情 (仅买家本人)
pub async fn get_by_id(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<OrderWithItems>> {
    let order_row = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if order_row.buyer_id != current_user.id {
        return Err(AppError::forbidden("Not authorized to view this order"));
    }

    let items = order::items_of(&state.pool, id).await?;
    Ok(Json(OrderWithItems {
        order: order_row,
        items,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CreateOrderItem>,
    pub shipping_address: ShippingAddressRequest,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /api/orders - 直接下单 (不经过购物车)
///
/// 价格与碳减排一律以目录当前值为准做快照，客户端提交的金额被忽略。
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppJson(req): AppJson<CreateOrderRequest>,
) -> AppResult<(StatusCode, Json<OrderWithItems>)> {
    if req.items.is_empty() {
        return Err(AppError::validation("Order items are required"));
    }

    let shipping_address = req.shipping_address.validate_into()?;
    let payment_method = parse_payment_method(req.payment_method.as_deref())?;
    let notes = req.notes.unwrap_or_default();
    validate_optional_text(&Some(notes.clone()), "notes", MAX_NOTE_LEN)?;

    let mut drafts = Vec::with_capacity(req.items.len());
    for item in &req.items {
        if item.quantity < 1 {
            return Err(AppError::validation("quantity must be at least 1"));
        }
        let listing = product::find_by_id(&state.pool, item.product_id)
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| {
                AppError::validation("Some products are no longer available")
            })?;
        if listing.seller_id == current_user.id {
            return Err(AppError::validation("Cannot order your own product"));
        }
        drafts.push(OrderItemDraft {
            product_id: listing.id,
            quantity: item.quantity,
            price: listing.price,
            co2_saved: listing.co2_saved,
        });
    }

    let created = order::create(
        &state.pool,
        OrderDraft {
            buyer_id: current_user.id,
            items: drafts,
            shipping_address,
            payment_method,
            notes,
        },
        None,
    )
    .await?;

    let items = order::items_of(&state.pool, created.id).await?;

    tracing::info!(
        order_id = %created.id,
        order_number = %created.order_number,
        buyer_id = %current_user.id,
        "Order created"
    );

    Ok((
        StatusCode::CREATED,
        Json(OrderWithItems {
            order: created,
            items,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// PUT /api/orders/:id/status - 推进订单状态 (仅订单内商品的卖家)
pub async fn update_status(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateStatusRequest>,
) -> AppResult<Json<OrderWithItems>> {
    let next = req
        .status
        .parse::<OrderStatus>()
        .map_err(|_| AppError::validation(valid_status_message()))?;

    let order_row = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;

    if !order::seller_in_order(&state.pool, id, current_user.id).await? {
        return Err(AppError::forbidden("Not authorized to update this order"));
    }

    if !order_row.status.can_transition_to(next) {
        return Err(AppError::validation(format!(
            "Cannot change status from {} to {}",
            order_row.status, next
        )));
    }

    order::update_status(&state.pool, id, next).await?;

    let order_row = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    let items = order::items_of(&state.pool, id).await?;

    tracing::info!(order_id = %id, status = %req.status, "Order status updated");

    Ok(Json(OrderWithItems {
        order: order_row,
        items,
    }))
}
