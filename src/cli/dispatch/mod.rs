use crate::cli::{
    actions::{
        server::{Args, SmtpArgs},
        Action,
    },
    commands::{auth, smtp, ARG_DSN, ARG_PORT, ARG_UPLOADS_ROOT},
};
use crate::credentials::LegacyPlaintext;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>(ARG_DSN)
        .cloned()
        .context("missing required argument: --dsn")?;
    let session_secret = matches
        .get_one::<String>(auth::ARG_SESSION_SECRET)
        .cloned()
        .map(SecretString::from)
        .context("missing required argument: --session-secret")?;

    let string_arg = |name: &str, default: &str| {
        matches
            .get_one::<String>(name)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };

    let smtp = matches
        .get_one::<String>(smtp::ARG_SMTP_HOST)
        .map(|host| SmtpArgs {
            host: host.clone(),
            port: matches
                .get_one::<u16>(smtp::ARG_SMTP_PORT)
                .copied()
                .unwrap_or(crate::notify::DEFAULT_SMTP_PORT),
            username: matches.get_one::<String>(smtp::ARG_SMTP_USERNAME).cloned(),
            password: matches
                .get_one::<String>(smtp::ARG_SMTP_PASSWORD)
                .cloned()
                .map(SecretString::from),
            from: matches.get_one::<String>(smtp::ARG_SMTP_FROM).cloned(),
        });

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret,
        session_ttl_seconds: matches
            .get_one::<i64>(auth::ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(crate::api::handlers::auth::DEFAULT_SESSION_TTL_SECONDS),
        session_cookie_secure: matches.get_flag(auth::ARG_SESSION_COOKIE_SECURE),
        legacy_plaintext: matches
            .get_one::<LegacyPlaintext>(auth::ARG_LEGACY_PLAINTEXT)
            .copied()
            .unwrap_or_default(),
        technician_capability: string_arg(
            auth::ARG_TECHNICIAN_CAPABILITY,
            crate::authz::DEFAULT_TECHNICIAN_CAPABILITY,
        ),
        user_capability: string_arg(
            auth::ARG_USER_CAPABILITY,
            crate::credentials::DEFAULT_USER_CAPABILITY,
        ),
        capability_overrides: matches
            .get_many::<String>(auth::ARG_CAPABILITY_OVERRIDE)
            .map(|values| values.cloned().collect())
            .unwrap_or_default(),
        recovery_code_length: matches
            .get_one::<usize>(auth::ARG_RECOVERY_CODE_LENGTH)
            .copied()
            .unwrap_or(crate::recovery::DEFAULT_CODE_LEN),
        uploads_root: PathBuf::from(string_arg(
            ARG_UPLOADS_ROOT,
            crate::api::handlers::tickets::DEFAULT_UPLOADS_ROOT,
        )),
        smtp,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;
    use secrecy::ExposeSecret;

    fn dispatch(extra: &[&str]) -> Result<Args> {
        let mut args = vec![
            "ticketdesk",
            "--dsn",
            "postgres://localhost:5432/ticketdesk",
            "--session-secret",
            "0123456789abcdef0123456789abcdef",
        ];
        args.extend_from_slice(extra);
        let mut result = None;
        temp_env::with_vars(
            [
                ("TICKETDESK_SMTP_HOST", None::<&str>),
                ("TICKETDESK_CAPABILITY_OVERRIDES", None),
                ("TICKETDESK_SESSION_COOKIE_SECURE", None),
                ("TICKETDESK_LEGACY_PLAINTEXT", None),
            ],
            || {
                let matches = commands::new().get_matches_from(args.clone());
                result = Some(handler(&matches));
            },
        );
        match result.context("dispatch did not run")?? {
            Action::Server(args) => Ok(args),
        }
    }

    #[test]
    fn server_action_defaults() -> Result<()> {
        let args = dispatch(&[])?;
        assert_eq!(args.port, 8080);
        assert_eq!(
            args.session_secret.expose_secret(),
            "0123456789abcdef0123456789abcdef"
        );
        assert_eq!(args.session_ttl_seconds, 28800);
        assert!(!args.session_cookie_secure);
        assert_eq!(args.legacy_plaintext, LegacyPlaintext::Always);
        assert_eq!(args.technician_capability, "Tecnico");
        assert_eq!(args.user_capability, "Usuario");
        assert!(args.capability_overrides.is_empty());
        assert_eq!(args.recovery_code_length, 6);
        assert_eq!(args.uploads_root, PathBuf::from("wwwroot"));
        assert!(args.smtp.is_none());
        Ok(())
    }

    #[test]
    fn server_action_with_smtp_and_overrides() -> Result<()> {
        let args = dispatch(&[
            "--smtp-host",
            "smtp.example.com",
            "--smtp-username",
            "desk@example.com",
            "--smtp-password",
            "pw",
            "--capability-override",
            "boss@example.com=Tecnico",
            "--session-cookie-secure",
            "--legacy-plaintext",
            "non-digest",
        ])?;
        assert!(args.session_cookie_secure);
        assert_eq!(args.legacy_plaintext, LegacyPlaintext::NonDigest);
        assert_eq!(args.capability_overrides, vec!["boss@example.com=Tecnico"]);
        let smtp = args.smtp.context("smtp args")?;
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.username.as_deref(), Some("desk@example.com"));
        assert_eq!(
            smtp.password.as_ref().map(|pw| pw.expose_secret()),
            Some("pw")
        );
        Ok(())
    }
}
