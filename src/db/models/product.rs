//! Product Model

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::str::FromStr;

/// 商品分类 (封闭枚举)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Category {
    Electronics,
    Clothing,
    Home,
    Books,
    Sports,
}

impl Category {
    pub const ALL: &'static [Category] = &[
        Category::Electronics,
        Category::Clothing,
        Category::Home,
        Category::Books,
        Category::Sports,
    ];
}

impl FromStr for Category {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Electronics" => Ok(Category::Electronics),
            "Clothing" => Ok(Category::Clothing),
            "Home" => Ok(Category::Home),
            "Books" => Ok(Category::Books),
            "Sports" => Ok(Category::Sports),
            _ => Err(()),
        }
    }
}

/// 商品成色 (封闭枚举)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Condition {
    #[serde(rename = "Like New")]
    #[sqlx(rename = "Like New")]
    LikeNew,
    #[serde(rename = "Very Good")]
    #[sqlx(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
}

impl FromStr for Condition {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Like New" => Ok(Condition::LikeNew),
            "Very Good" => Ok(Condition::VeryGood),
            "Good" => Ok(Condition::Good),
            "Fair" => Ok(Condition::Fair),
            _ => Err(()),
        }
    }
}

/// Seller-declared pickup location
#[derive(Debug, Clone, Default, Serialize, Deserialize, sqlx::FromRow)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default = "default_country")]
    pub country: String,
}

pub(crate) fn default_country() -> String {
    "US".to_string()
}

/// Product listing matching the `product` table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub images: Json<Vec<String>>,
    pub seller_id: i64,
    pub is_active: bool,
    pub co2_saved: f64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub location: Location,
    pub tags: Json<Vec<String>>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Product with its seller's public identity embedded (list/detail views)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductWithSeller {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub seller_username: String,
    pub seller_email: String,
}

/// Create product payload (already validated and enum-parsed)
#[derive(Debug, Clone)]
pub struct ProductCreate {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub condition: Condition,
    pub images: Vec<String>,
    pub co2_saved: f64,
    pub location: Location,
    pub tags: Vec<String>,
}

/// Partial update payload; `None` keeps the stored value. Seller and id
/// are immutable by construction.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub condition: Option<Condition>,
    pub images: Option<Vec<String>>,
    pub co2_saved: Option<f64>,
    pub location: Option<Location>,
    pub tags: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// 商品列表排序方式
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
}

impl ProductSort {
    /// ORDER BY clause fragment for this sort mode.
    pub fn order_by(&self) -> &'static str {
        match self {
            ProductSort::PriceAsc => "p.price ASC",
            ProductSort::PriceDesc => "p.price DESC",
            ProductSort::Newest => "p.created_at DESC",
        }
    }
}
