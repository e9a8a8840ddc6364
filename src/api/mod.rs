//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册 / 登录 / 验证码
//! - [`products`] - 商品目录
//! - [`cart`] - 购物车与结算
//! - [`orders`] - 订单历史与状态
//! - [`upload`] - 图片上传

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod upload;

use axum::extract::{FromRequest, FromRequestParts};

use crate::utils::AppError;

/// JSON body extractor whose rejection keeps the `{ "error": ... }`
/// envelope (malformed input is a 400, never a framework text response).
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Query extractor with the same rejection envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

/// Path extractor with the same rejection envelope.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);
