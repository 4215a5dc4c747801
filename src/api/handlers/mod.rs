//! API handlers for ticketdesk.
//!
//! Auth handlers own the session cookie; ticket handlers consume the
//! principal it carries.

pub mod auth;
pub mod health;
pub mod tickets;
