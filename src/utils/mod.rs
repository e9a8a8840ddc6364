//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] / [`AppResult`] - 应用错误类型和别名
//! - [`validation`] - 输入校验辅助函数
//! - [`logger`] - 日志初始化
//! - [`ids`] - 时间戳与 ID 生成

pub mod error;
pub mod ids;
pub mod logger;
pub mod types;
pub mod validation;

pub use error::{AppError, AppResult};
pub use ids::{now_millis, snowflake_id};
pub use types::{PageQuery, Pagination};
