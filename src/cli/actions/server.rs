use crate::{
    api::{self, handlers::auth::AuthConfig, ServiceConfig},
    authz::CapabilityOverrides,
    cli::telemetry,
    credentials::LegacyPlaintext,
    notify::SmtpConfig,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub session_cookie_secure: bool,
    pub legacy_plaintext: LegacyPlaintext,
    pub technician_capability: String,
    pub user_capability: String,
    pub capability_overrides: Vec<String>,
    pub recovery_code_length: usize,
    pub uploads_root: PathBuf,
    pub smtp: Option<SmtpArgs>,
}

#[derive(Debug)]
pub struct SmtpArgs {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub from: Option<String>,
}

impl Args {
    /// Build the runtime configuration from parsed arguments.
    /// # Errors
    /// Returns an error if a capability override is malformed.
    pub fn service_config(&self) -> Result<ServiceConfig> {
        let auth = AuthConfig::new(self.session_secret.clone())
            .with_session_ttl_seconds(self.session_ttl_seconds)
            .with_session_cookie_secure(self.session_cookie_secure);

        let overrides = CapabilityOverrides::parse(self.capability_overrides.as_slice())
            .context("invalid --capability-override")?;

        let smtp = self.smtp.as_ref().map(|smtp| {
            let mut config = SmtpConfig::new(smtp.host.clone()).with_port(smtp.port);
            if let Some(username) = &smtp.username {
                config = config.with_credentials(
                    username.clone(),
                    smtp.password.clone().unwrap_or_else(|| SecretString::from("")),
                );
            }
            config.with_from(smtp.from.clone())
        });

        Ok(ServiceConfig::new(auth)
            .with_technician_capability(self.technician_capability.clone())
            .with_user_capability(self.user_capability.clone())
            .with_overrides(overrides)
            .with_legacy_plaintext(self.legacy_plaintext)
            .with_recovery_code_length(Some(self.recovery_code_length))
            .with_uploads_root(self.uploads_root.clone())
            .with_smtp(smtp))
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is invalid, the configuration is rejected, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let dsn = Url::parse(&args.dsn).map_err(|err| anyhow!("invalid --dsn: {err}"))?;
    let config = args.service_config()?;
    log_startup_args(&args, config.overrides().len());

    let result = api::new(args.port, dsn.to_string(), config).await;
    telemetry::shutdown_tracer();
    result
}

fn log_startup_args(args: &Args, overrides: usize) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("session_ttl_seconds", args.session_ttl_seconds.to_string()),
        (
            "session_cookie_secure",
            args.session_cookie_secure.to_string(),
        ),
        ("legacy_plaintext", format!("{:?}", args.legacy_plaintext)),
        ("technician_capability", args.technician_capability.clone()),
        ("user_capability", args.user_capability.clone()),
        ("capability_overrides", overrides.to_string()),
        ("recovery_code_length", args.recovery_code_length.to_string()),
        ("uploads_root", args.uploads_root.display().to_string()),
        (
            "smtp",
            args.smtp
                .as_ref()
                .map_or_else(|| "log only".to_string(), |smtp| {
                    format!("{}:{}", smtp.host, smtp.port)
                }),
        ),
    ];
    log_entries("Startup configuration", &entries);
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn log_entries(title: &str, entries: &[(&str, String)]) {
    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\n{title}:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> String {
    let trimmed = hash.trim();
    if trimmed.len() > 7 {
        trimmed[..7].to_string()
    } else {
        trimmed.to_string()
    }
}
