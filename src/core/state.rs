use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::services::Mailer;
use crate::utils::now_millis;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是服务的核心数据结构，持有所有共享资源。
/// 使用 Arc / 连接池实现浅拷贝，克隆成本极低。
///
/// # 组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | mailer | Arc<Mailer> | 出站邮件服务 |
/// | started_at | i64 | 启动时间戳 (毫秒) |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub pool: SqlitePool,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 出站邮件服务
    pub mailer: Arc<Mailer>,
    /// 启动时间戳
    pub started_at: i64,
}

impl ServerState {
    /// 创建服务器状态 (手动构造；测试与 [`initialize()`] 共用)
    pub fn new(config: Config, pool: SqlitePool, jwt_service: JwtService, mailer: Mailer) -> Self {
        Self {
            config,
            pool,
            jwt_service: Arc::new(jwt_service),
            mailer: Arc::new(mailer),
            started_at: now_millis(),
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (确保目录存在)
    /// 2. 数据库 (work_dir/database/ecomarket.db, 自动迁移)
    /// 3. 邮件服务 (SMTP 或日志传输)
    /// 4. JWT 服务
    pub async fn initialize(config: &Config) -> anyhow::Result<Self> {
        config.ensure_work_dir_structure()?;

        let db_path = config.database_dir().join("ecomarket.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        let mailer = Mailer::from_config(&config.mail)?;
        let jwt_service = JwtService::with_config(config.jwt.clone());

        Ok(Self::new(config.clone(), db_service.pool, jwt_service, mailer))
    }

    /// 获取 JWT 服务
    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 运行时长 (毫秒)
    pub fn uptime_ms(&self) -> i64 {
        now_millis() - self.started_at
    }
}
