//! Product Repository

use super::{RepoError, RepoResult};
use crate::db::models::{
    Category, Product, ProductCreate, ProductSort, ProductUpdate, ProductWithSeller,
};
use crate::utils::{now_millis, snowflake_id};
use sqlx::SqlitePool;
use sqlx::types::Json;

/// Catalog listing filters
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: Option<Category>,
    pub search: Option<String>,
    pub sort: ProductSort,
    pub limit: i64,
    pub offset: i64,
}

fn search_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

/// Filtered, paginated catalog read (active listings only), with the
/// seller's public identity joined in.
pub async fn find_filtered(
    pool: &SqlitePool,
    filter: &ProductFilter,
) -> RepoResult<(Vec<ProductWithSeller>, i64)> {
    let mut where_clause = String::from("p.is_active = 1");
    if filter.category.is_some() {
        where_clause.push_str(" AND p.category = ?");
    }
    if filter.search.is_some() {
        where_clause.push_str(
            " AND (p.title LIKE ? OR p.description LIKE ? OR p.tags LIKE ?)",
        );
    }

    let select_sql = format!(
        "SELECT p.*, u.username AS seller_username, u.email AS seller_email \
         FROM product p JOIN user u ON u.id = p.seller_id \
         WHERE {where_clause} ORDER BY {} LIMIT ? OFFSET ?",
        filter.sort.order_by()
    );
    let count_sql = format!("SELECT COUNT(*) FROM product p WHERE {where_clause}");

    let mut select_query = sqlx::query_as::<_, ProductWithSeller>(&select_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);

    if let Some(category) = filter.category {
        select_query = select_query.bind(category);
        count_query = count_query.bind(category);
    }
    if let Some(search) = &filter.search {
        let pattern = search_pattern(search);
        select_query = select_query
            .bind(pattern.clone())
            .bind(pattern.clone())
            .bind(pattern.clone());
        count_query = count_query
            .bind(pattern.clone())
            .bind(pattern.clone())
            .bind(pattern);
    }

    let products = select_query
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;
    let total = count_query.fetch_one(pool).await?;

    Ok((products, total))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM product WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(product)
}

/// Single product with seller identity, for the public detail view.
pub async fn find_with_seller(
    pool: &SqlitePool,
    id: i64,
) -> RepoResult<Option<ProductWithSeller>> {
    let product = sqlx::query_as::<_, ProductWithSeller>(
        "SELECT p.*, u.username AS seller_username, u.email AS seller_email \
         FROM product p JOIN user u ON u.id = p.seller_id WHERE p.id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

/// A seller's own active listings, newest first.
pub async fn find_by_seller(pool: &SqlitePool, seller_id: i64) -> RepoResult<Vec<ProductWithSeller>> {
    let products = sqlx::query_as::<_, ProductWithSeller>(
        "SELECT p.*, u.username AS seller_username, u.email AS seller_email \
         FROM product p JOIN user u ON u.id = p.seller_id \
         WHERE p.seller_id = ? AND p.is_active = 1 ORDER BY p.created_at DESC",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn create(
    pool: &SqlitePool,
    seller_id: i64,
    data: ProductCreate,
) -> RepoResult<Product> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO product (id, title, description, price, category, condition, images, \
         seller_id, co2_saved, city, state, country, tags, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.category)
    .bind(data.condition)
    .bind(Json(&data.images))
    .bind(seller_id)
    .bind(data.co2_saved)
    .bind(&data.location.city)
    .bind(&data.location.state)
    .bind(&data.location.country)
    .bind(Json(&data.tags))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Partial update; absent fields keep their stored values.
pub async fn update(pool: &SqlitePool, id: i64, data: ProductUpdate) -> RepoResult<Product> {
    let (city, state, country) = match &data.location {
        Some(loc) => (
            Some(loc.city.clone()),
            Some(loc.state.clone()),
            Some(loc.country.clone()),
        ),
        None => (None, None, None),
    };

    let rows = sqlx::query(
        "UPDATE product SET \
         title = COALESCE(?1, title), \
         description = COALESCE(?2, description), \
         price = COALESCE(?3, price), \
         category = COALESCE(?4, category), \
         condition = COALESCE(?5, condition), \
         images = COALESCE(?6, images), \
         co2_saved = COALESCE(?7, co2_saved), \
         city = COALESCE(?8, city), \
         state = COALESCE(?9, state), \
         country = COALESCE(?10, country), \
         tags = COALESCE(?11, tags), \
         is_active = COALESCE(?12, is_active), \
         updated_at = ?13 \
         WHERE id = ?14",
    )
    .bind(data.title)
    .bind(data.description)
    .bind(data.price)
    .bind(data.category)
    .bind(data.condition)
    .bind(data.images.map(Json))
    .bind(data.co2_saved)
    .bind(city)
    .bind(state)
    .bind(country)
    .bind(data.tags.map(Json))
    .bind(data.is_active)
    .bind(now_millis())
    .bind(id)
    .execute(pool)
    .await?;

    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

/// Soft delete — the row survives so historical orders keep resolving.
pub async fn soft_delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE product SET is_active = 0, updated_at = ? WHERE id = ?")
        .bind(now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() == 1)
}
