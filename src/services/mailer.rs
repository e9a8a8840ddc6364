//! Outbound email service
//!
//! Transport is selected once at startup from config and injected through
//! [`ServerState`](crate::core::ServerState):
//!
//! - `Smtp` — real delivery via lettre when SMTP settings are present
//! - `Log` — development fallback that writes the mail to the server log
//! - `Capture` — in-process sink used by tests to observe outbound mail
//!
//! Nothing else in the codebase reads mail settings from the environment.

use std::sync::{Arc, Mutex};

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::core::config::MailConfig;

/// Errors that can occur when sending email
#[derive(Debug, Error)]
pub enum MailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// A sent (or captured) email
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Clone)]
enum MailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    Log,
    Capture(Arc<Mutex<Vec<OutboundEmail>>>),
}

/// Outbound email service
#[derive(Clone)]
pub struct Mailer {
    transport: MailTransport,
    from_address: String,
}

impl Mailer {
    /// Build the mailer from config. SMTP settings present → real SMTP
    /// (STARTTLS relay); absent → log transport.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let transport = match &config.smtp_host {
            Some(host) => {
                let credentials = Credentials::new(
                    config.smtp_username.clone(),
                    config.smtp_password.clone(),
                );
                let smtp = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
                    .port(config.smtp_port)
                    .credentials(credentials)
                    .build();
                MailTransport::Smtp(smtp)
            }
            None => {
                tracing::warn!("SMTP not configured; outbound mail goes to the server log");
                MailTransport::Log
            }
        };

        Ok(Self {
            transport,
            from_address: config.from_address.clone(),
        })
    }

    /// Mailer that records every send into the returned buffer. Used by
    /// tests to observe codes without a mail relay.
    pub fn capture() -> (Self, Arc<Mutex<Vec<OutboundEmail>>>) {
        let outbox = Arc::new(Mutex::new(Vec::new()));
        let mailer = Self {
            transport: MailTransport::Capture(outbox.clone()),
            from_address: "no-reply@ecomarket.example".to_string(),
        };
        (mailer, outbox)
    }

    /// Send the login code email. The code itself is never logged.
    pub async fn send_login_code(&self, to: &str, code: &str) -> Result<(), MailError> {
        let subject = "Your EcoMarket login code".to_string();
        let body = format!(
            "Your EcoMarket login code is {code}. It is valid for 5 minutes.\n\n\
             If you did not request this code, you can ignore this email."
        );
        self.send(to, subject, body).await
    }

    async fn send(&self, to: &str, subject: String, body: String) -> Result<(), MailError> {
        match &self.transport {
            MailTransport::Smtp(smtp) => {
                let email = Message::builder()
                    .from(
                        self.from_address
                            .parse()
                            .map_err(|_| MailError::InvalidAddress(self.from_address.clone()))?,
                    )
                    .to(to
                        .parse()
                        .map_err(|_| MailError::InvalidAddress(to.to_string()))?)
                    .subject(&subject)
                    .header(ContentType::TEXT_PLAIN)
                    .body(body)?;

                smtp.send(email).await?;
                tracing::info!(to = %to, subject = %subject, "Email dispatched via SMTP");
                Ok(())
            }
            MailTransport::Log => {
                tracing::info!(to = %to, subject = %subject, "Email (log transport): {body}");
                Ok(())
            }
            MailTransport::Capture(outbox) => {
                if let Ok(mut outbox) = outbox.lock() {
                    outbox.push(OutboundEmail {
                        to: to.to_string(),
                        subject,
                        body,
                    });
                }
                Ok(())
            }
        }
    }
}
