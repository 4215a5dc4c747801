use clap::{Arg, Command};

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_FROM: &str = "smtp-from";

/// Mail relay options; without `--smtp-host` messages are only logged.
#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host for recovery emails")
                .env("TICKETDESK_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port (STARTTLS)")
                .env("TICKETDESK_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username")
                .env("TICKETDESK_SMTP_USERNAME")
                .requires(ARG_SMTP_HOST),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("TICKETDESK_SMTP_PASSWORD")
                .hide_env_values(true)
                .requires(ARG_SMTP_USERNAME),
        )
        .arg(
            Arg::new(ARG_SMTP_FROM)
                .long(ARG_SMTP_FROM)
                .help("Sender address; defaults to the SMTP username")
                .env("TICKETDESK_SMTP_FROM"),
        )
}
