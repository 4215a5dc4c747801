//! Ticket handlers. Every permission decision goes through
//! [`crate::authz::TicketAccessGuard`].

pub mod attachment;
mod state;
pub mod ticket;
pub mod types;

pub use state::{TicketState, DEFAULT_UPLOADS_ROOT};
