use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置 - 所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、上传文件、日志) |
/// | HTTP_PORT | 4000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | (dev 自动生成) | JWT 密钥，生产必填 |
/// | SMTP_HOST | (未设置则走日志) | SMTP 服务器 |
/// | SMTP_PORT | 587 | SMTP 端口 |
/// | SMTP_USER / SMTP_PASS | "" | SMTP 凭据 |
/// | MAIL_FROM | no-reply@ecomarket.example | 发件人地址 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/ecomarket HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、上传文件、日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 邮件配置
    pub mail: MailConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
}

/// 邮件配置 - 启动时注入 Mailer，绝不在请求路径里读环境变量
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// SMTP 服务器；未设置时使用日志传输 (开发环境)
    pub smtp_host: Option<String>,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// 发件人地址
    pub from_address: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4000),
            jwt: JwtConfig::default(),
            mail: MailConfig {
                smtp_host: std::env::var("SMTP_HOST").ok().filter(|h| !h.is_empty()),
                smtp_port: std::env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                smtp_username: std::env::var("SMTP_USER").unwrap_or_default(),
                smtp_password: std::env::var("SMTP_PASS").unwrap_or_default(),
                from_address: std::env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@ecomarket.example".into()),
            },
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// 数据库目录: work_dir/database
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 上传根目录: work_dir/uploads (静态服务挂载点)
    pub fn uploads_root(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("uploads")
    }

    /// 图片目录: work_dir/uploads/images
    pub fn images_dir(&self) -> PathBuf {
        self.uploads_root().join("images")
    }

    /// 日志目录: work_dir/logs
    pub fn logs_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.images_dir())?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
