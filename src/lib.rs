//! EcoMarket Server - 二手商品集市后端
//!
//! # 架构概述
//!
//! 单进程 HTTP/JSON 服务，嵌入式 SQLite 存储：
//!
//! - **认证** (`auth`): 密码 + 邮箱验证码两步登录，JWT 令牌
//! - **数据库** (`db`): SQLite 连接池、迁移、仓储层
//! - **HTTP API** (`api`): 商品目录、购物车、订单、上传
//! - **服务** (`services`): 出站邮件
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT、验证码、请求提取器
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (models + repository)
//! ├── services/      # 邮件
//! └── utils/         # 错误、校验、日志、ID
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use crate::auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState, build_app, build_router};
pub use crate::services::Mailer;
pub use crate::utils::{AppError, AppResult};

// Re-export logger functions
pub use crate::utils::logger::{init_logger, init_logger_with_file};

/// 环境初始化: .env + 日志
pub fn setup_environment() {
    let _ = dotenv::dotenv();
    init_logger();
}

pub fn print_banner() {
    println!(
        r#"
    ______          __  ___           __        __
   / ____/________ /  |/  /___ ______/ /_____  / /_
  / __/ / ___/ __ \/ /|_/ / __ `/ ___/ //_/ _ \/ __/
 / /___/ /__/ /_/ / /  / / /_/ / /  / ,< /  __/ /_
/_____/\___/\____/_/  /_/\__,_/_/  /_/|_|\___/\__/
    "#
    );
}
