//! # Ticketdesk (support tickets with capability-based access)
//!
//! `ticketdesk` serves a small support-ticket API. Most of it is plumbing; the
//! parts that carry real rules are credential handling and ticket access.
//!
//! ## Credentials
//!
//! Passwords are stored as an unsalted SHA-256 digest encoded as base64. Older
//! rows may still hold the plaintext password; a successful login against such
//! a row rewrites it to the digest. Password recovery uses short numeric codes
//! delivered by a [`notify::Notifier`].
//!
//! ## Capabilities
//!
//! A session carries a [`Principal`]. Whether that principal is a technician is
//! decided by [`authz::AuthorizationResolver`], which checks every claim source
//! that has ever been used to tag support staff. [`authz::TicketAccessGuard`]
//! turns that decision into list/view/respond/download permissions.
//!
//! Technicians see every ticket. Everyone else only sees tickets opened with
//! their own email address.

pub mod api;
pub mod authz;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod notify;
pub mod principal;
pub mod recovery;
pub mod tickets;

pub use error::ServiceError;
pub use principal::Principal;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
