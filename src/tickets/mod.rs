//! Support tickets and their storage.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use memory::MemoryTicketStore;
pub use models::{NewTicket, Ticket, STATUS_ANSWERED, STATUS_OPEN};
pub use postgres::PgTicketStore;
pub use store::TicketStore;
