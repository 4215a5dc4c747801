//! Outbound message delivery.
//!
//! Recovery codes are handed to a [`Notifier`]. Without SMTP configuration the
//! service runs with [`LogNotifier`], which only records that a message would
//! have been sent.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

pub mod smtp;

pub use smtp::{SmtpConfig, SmtpNotifier, DEFAULT_SMTP_PORT};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a plain-text message or return an error.
    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Local dev notifier that logs the recipient and subject, never the body.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_message(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!(to = %to, subject = %subject, "notification send stub");
        Ok(())
    }
}
