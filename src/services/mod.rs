//! 服务模块 - 外部协作者封装
//!
//! - [`mailer`] - 出站邮件 (SMTP / 日志 / 内存捕获)

pub mod mailer;

pub use mailer::{MailError, Mailer, OutboundEmail};
