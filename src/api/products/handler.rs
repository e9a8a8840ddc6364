//! Product API Handlers
//!
//! Public reads over the active catalog, owner-gated writes. Deletion is
//! always a soft delete so historical orders keep resolving.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::api::{AppJson, AppPath, AppQuery};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    Category, Condition, Location, Product, ProductCreate, ProductSort, ProductUpdate,
    ProductWithSeller,
};
use crate::db::repository::product::{self, ProductFilter};
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_PRODUCT_IMAGES, MAX_PRODUCT_TAGS, MAX_TITLE_LEN, MAX_URL_LEN,
    validate_non_negative, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, PageQuery, Pagination};

/// Query params for the catalog listing
///
/// page/limit are kept inline (not flattened) because the urlencoded
/// deserializer cannot type-hint numbers through `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListQuery {
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
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<ProductWithSeller>,
    pub pagination: Pagination,
}

fn parse_category(value: &str) -> Result<Category, AppError> {
    value.parse::<Category>().map_err(|_| {
        AppError::validation(
            "category must be one of: Electronics, Clothing, Home, Books, Sports",
        )
    })
}

fn parse_condition(value: &str) -> Result<Condition, AppError> {
    value.parse::<Condition>().map_err(|_| {
        AppError::validation("condition must be one of: Like New, Very Good, Good, Fair")
    })
}

fn parse_sort(value: Option<&str>) -> Result<ProductSort, AppError> {
    match value {
        None | Some("") => Ok(ProductSort::Newest),
        Some("price_asc") => Ok(ProductSort::PriceAsc),
        Some("price_desc") => Ok(ProductSort::PriceDesc),
        Some("newest") => Ok(ProductSort::Newest),
        Some(_) => Err(AppError::validation(
            "sort must be one of: price_asc, price_desc, newest",
        )),
    }
}

/// GET /api/products - 目录列表 (公开，只含在售商品)
pub async fn list(
    State(state): State<ServerState>,
    AppQuery(query): AppQuery<ListQuery>,
) -> AppResult<Json<ProductListResponse>> {
    let category = match query.category.as_deref() {
        None | Some("all") | Some("") => None,
        Some(raw) => Some(parse_category(raw)?),
    };

    let page = query.page_query();
    let (_, limit) = page.clamped();
    let filter = ProductFilter {
        category,
        search: query.search.clone().filter(|s| !s.trim().is_empty()),
        sort: parse_sort(query.sort.as_deref())?,
        limit,
        offset: page.offset(),
    };

    let (products, total) = product::find_filtered(&state.pool, &filter).await?;

    Ok(Json(ProductListResponse {
        products,
        pagination: Pagination::new(&page, total),
    }))
}

/// GET /api/products/:id - 商品详情 (公开；下架商品 404)
pub async fn get_by_id(
    State(state): State<ServerState>,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<ProductWithSeller>> {
    let product = product::find_with_seller(&state.pool, id)
        .await?
        .filter(|p| p.product.is_active)
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub condition: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub co2_saved: f64,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub tags: Vec<String>,
}

fn validate_media(images: &[String], tags: &[String]) -> Result<(), AppError> {
    if images.len() > MAX_PRODUCT_IMAGES {
        return Err(AppError::validation(format!(
            "at most {MAX_PRODUCT_IMAGES} images allowed"
        )));
    }
    for url in images {
        if url.len() > MAX_URL_LEN {
            return Err(AppError::validation("image URL is too long"));
        }
    }
    if tags.len() > MAX_PRODUCT_TAGS {
        return Err(AppError::validation(format!(
            "at most {MAX_PRODUCT_TAGS} tags allowed"
        )));
    }
    Ok(())
}

/// POST /api/products - 发布商品
pub async fn create(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppJson(req): AppJson<CreateProductRequest>,
) -> AppResult<(StatusCode, Json<Product>)> {
    validate_required_text(&req.title, "title", MAX_TITLE_LEN)?;
    validate_required_text(&req.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_non_negative(req.price, "price")?;
    validate_non_negative(req.co2_saved, "co2_saved")?;
    validate_media(&req.images, &req.tags)?;

    let data = ProductCreate {
        title: req.title.trim().to_string(),
        description: req.description.trim().to_string(),
        price: req.price,
        category: parse_category(&req.category)?,
        condition: parse_condition(&req.condition)?,
        images: req.images,
        co2_saved: req.co2_saved,
        location: req.location.unwrap_or_default(),
        tags: req.tags,
    };

    let created = product::create(&state.pool, current_user.id, data).await?;

    tracing::info!(
        product_id = %created.id,
        seller_id = %current_user.id,
        "Product listed"
    );

    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub condition: Option<String>,
    pub images: Option<Vec<String>>,
    pub co2_saved: Option<f64>,
    pub location: Option<Location>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// 只有商品归属的卖家可以改动它。
async fn load_owned_product(
    state: &ServerState,
    product_id: i64,
    user_id: i64,
) -> AppResult<Product> {
    let product = product::find_by_id(&state.pool, product_id)
        .await?
        .ok_or_else(|| AppError::not_found("Product not found"))?;
    if product.seller_id != user_id {
        return Err(AppError::forbidden("Not authorized to modify this product"));
    }
    Ok(product)
}

/// PUT /api/products/:id - 更新商品 (仅卖家本人)
pub async fn update(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
    AppJson(req): AppJson<UpdateProductRequest>,
) -> AppResult<Json<Product>> {
    load_owned_product(&state, id, current_user.id).await?;

    if let Some(title) = &req.title {
        validate_required_text(title, "title", MAX_TITLE_LEN)?;
    }
    if let Some(description) = &req.description {
        validate_required_text(description, "description", MAX_DESCRIPTION_LEN)?;
    }
    validate_optional_text(&req.category, "category", MAX_TITLE_LEN)?;
    if let Some(price) = req.price {
        validate_non_negative(price, "price")?;
    }
    if let Some(co2) = req.co2_saved {
        validate_non_negative(co2, "co2_saved")?;
    }
    validate_media(
        req.images.as_deref().unwrap_or(&[]),
        req.tags.as_deref().unwrap_or(&[]),
    )?;

    let data = ProductUpdate {
        title: req.title,
        description: req.description,
        price: req.price,
        category: req.category.as_deref().map(parse_category).transpose()?,
        condition: req.condition.as_deref().map(parse_condition).transpose()?,
        images: req.images,
        co2_saved: req.co2_saved,
        location: req.location,
        tags: req.tags,
        is_active: req.is_active,
    };

    let updated = product::update(&state.pool, id, data).await?;
    Ok(Json(updated))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// DELETE /api/products/:id - 下架商品 (软删除，仅卖家本人)
pub async fn delete(
    State(state): State<ServerState>,
    current_user: CurrentUser,
    AppPath(id): AppPath<i64>,
) -> AppResult<Json<DeleteResponse>> {
    load_owned_product(&state, id, current_user.id).await?;
    product::soft_delete(&state.pool, id).await?;

    tracing::info!(product_id = %id, seller_id = %current_user.id, "Product delisted");

    Ok(Json(DeleteResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

/// GET /api/products/user/my-listings - 当前用户的在售商品
pub async fn my_listings(
    State(state): State<ServerState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<ProductWithSeller>>> {
    let products = product::find_by_seller(&state.pool, current_user.id).await?;
    Ok(Json(products))
}
