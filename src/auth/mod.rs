//! 认证模块 - JWT 令牌、请求提取器、一次性验证码
//!
//! # 结构
//!
//! - [`jwt`] - 令牌签发与验证
//! - [`extractor`] - `CurrentUser` 请求提取器 (受保护接口的唯一入口)
//! - [`otp`] - 验证码生成与哈希

pub mod extractor;
pub mod jwt;
pub mod otp;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
