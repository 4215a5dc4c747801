use clap::{builder::ValueParser, Arg, ArgAction, Command};

use crate::api::handlers::auth::MIN_SESSION_SECRET_LEN;
use crate::credentials::LegacyPlaintext;

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_SESSION_COOKIE_SECURE: &str = "session-cookie-secure";
pub const ARG_TECHNICIAN_CAPABILITY: &str = "technician-capability";
pub const ARG_USER_CAPABILITY: &str = "user-capability";
pub const ARG_CAPABILITY_OVERRIDE: &str = "capability-override";
pub const ARG_RECOVERY_CODE_LENGTH: &str = "recovery-code-length";
pub const ARG_LEGACY_PLAINTEXT: &str = "legacy-plaintext";

#[must_use]
pub fn validator_session_secret() -> ValueParser {
    ValueParser::from(move |secret: &str| -> std::result::Result<String, String> {
        if secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(format!(
                "session secret must be at least {MIN_SESSION_SECRET_LEN} bytes"
            ));
        }
        Ok(secret.to_string())
    })
}

#[must_use]
pub fn validator_session_ttl() -> ValueParser {
    ValueParser::from(move |ttl: &str| -> std::result::Result<i64, String> {
        match ttl.parse::<i64>() {
            Ok(seconds) if seconds > 0 => Ok(seconds),
            _ => Err("session TTL must be a positive number of seconds".to_string()),
        }
    })
}

#[must_use]
pub fn validator_legacy_plaintext() -> ValueParser {
    ValueParser::from(move |policy: &str| -> std::result::Result<LegacyPlaintext, String> {
        policy.parse::<LegacyPlaintext>()
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    let command = with_session_args(command);
    with_capability_args(command)
}

fn with_session_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Key used to sign session cookies")
                .env("TICKETDESK_SESSION_SECRET")
                .hide_env_values(true)
                .required(true)
                .value_parser(validator_session_secret()),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session cookie TTL in seconds")
                .env("TICKETDESK_SESSION_TTL_SECONDS")
                .default_value("28800")
                .value_parser(validator_session_ttl()),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE_SECURE)
                .long(ARG_SESSION_COOKIE_SECURE)
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("TICKETDESK_SESSION_COOKIE_SECURE")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(ARG_LEGACY_PLAINTEXT)
                .long(ARG_LEGACY_PLAINTEXT)
                .help("Stored passwords compared as legacy plaintext: always, or non-digest to skip values shaped like a digest")
                .env("TICKETDESK_LEGACY_PLAINTEXT")
                .default_value("always")
                .value_parser(validator_legacy_plaintext()),
        )
}

fn with_capability_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_TECHNICIAN_CAPABILITY)
                .long(ARG_TECHNICIAN_CAPABILITY)
                .help("Capability value that grants technician access")
                .env("TICKETDESK_TECHNICIAN_CAPABILITY")
                .default_value(crate::authz::DEFAULT_TECHNICIAN_CAPABILITY),
        )
        .arg(
            Arg::new(ARG_USER_CAPABILITY)
                .long(ARG_USER_CAPABILITY)
                .help("Capability given to accounts without a profile tag")
                .env("TICKETDESK_USER_CAPABILITY")
                .default_value(crate::credentials::DEFAULT_USER_CAPABILITY),
        )
        .arg(
            Arg::new(ARG_CAPABILITY_OVERRIDE)
                .long(ARG_CAPABILITY_OVERRIDE)
                .help("Per-account capability, as email=Capability (repeatable or comma separated)")
                .env("TICKETDESK_CAPABILITY_OVERRIDES")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_RECOVERY_CODE_LENGTH)
                .long(ARG_RECOVERY_CODE_LENGTH)
                .help("Number of digits in password recovery codes")
                .env("TICKETDESK_RECOVERY_CODE_LENGTH")
                .default_value("6")
                .value_parser(clap::value_parser!(usize)),
        )
}
