//! SMTP delivery via lettre.
//!
//! Each message is first tried over STARTTLS on the configured port and, if
//! that fails, over implicit TLS on port 465.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{info, warn};

use super::Notifier;

pub const DEFAULT_SMTP_PORT: u16 = 587;
const IMPLICIT_TLS_PORT: u16 = 465;
const SEND_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<SecretString>,
    from: Option<String>,
}

impl SmtpConfig {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_SMTP_PORT,
            username: None,
            password: None,
            from: None,
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, username: String, password: SecretString) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn with_from(mut self, from: Option<String>) -> Self {
        self.from = from;
        self
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Sender address: explicit `from`, else the login username.
    fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }
}

#[derive(Clone, Copy, Debug)]
enum Attempt {
    StartTls(u16),
    ImplicitTls,
}

impl Attempt {
    fn describe(self) -> String {
        match self {
            Self::StartTls(port) => format!("port {port} (STARTTLS)"),
            Self::ImplicitTls => format!("port {IMPLICIT_TLS_PORT} (TLS)"),
        }
    }
}

pub struct SmtpNotifier {
    config: SmtpConfig,
    sender: Mailbox,
}

impl SmtpNotifier {
    /// # Errors
    /// Returns an error if no sender address is configured or it does not parse.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let sender = config
            .sender()
            .ok_or_else(|| anyhow!("SMTP sender missing: set --smtp-from or --smtp-username"))?
            .parse::<Mailbox>()
            .context("invalid SMTP sender address")?;
        Ok(Self { config, sender })
    }

    fn transport(&self, attempt: Attempt) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = match attempt {
            Attempt::StartTls(port) => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?.port(port)
            }
            Attempt::ImplicitTls => {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&self.config.host)?
                    .port(IMPLICIT_TLS_PORT)
            }
        }
        .timeout(Some(SEND_TIMEOUT));

        let builder = match (&self.config.username, &self.config.password) {
            (Some(username), Some(password)) => builder.credentials(Credentials::new(
                username.clone(),
                password.expose_secret().to_string(),
            )),
            _ => builder,
        };
        Ok(builder.build())
    }

    fn attempts(&self) -> Vec<Attempt> {
        let mut attempts = vec![Attempt::StartTls(self.config.port)];
        if self.config.port != IMPLICIT_TLS_PORT {
            attempts.push(Attempt::ImplicitTls);
        }
        attempts
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_message(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let recipient = to
            .trim()
            .parse::<Mailbox>()
            .context("invalid recipient address")?;
        let subject = if subject.trim().is_empty() {
            "(no subject)"
        } else {
            subject
        };
        let message = Message::builder()
            .from(self.sender.clone())
            .to(recipient)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .context("failed to build message")?;

        let mut last_error = anyhow!("no SMTP attempt made");
        for attempt in self.attempts() {
            let result = match self.transport(attempt) {
                Ok(transport) => transport.send(message.clone()).await.map_err(anyhow::Error::from),
                Err(err) => Err(err),
            };
            match result {
                Ok(_) => {
                    info!(host = %self.config.host, via = %attempt.describe(), "message sent");
                    return Ok(());
                }
                Err(err) => {
                    warn!(host = %self.config.host, via = %attempt.describe(), "SMTP attempt failed: {err}");
                    last_error = err;
                }
            }
        }
        Err(last_error.context("all SMTP attempts failed"))
    }
}
