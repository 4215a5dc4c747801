//! Storage seam for tickets.

use async_trait::async_trait;

use super::models::{NewTicket, Ticket};
use crate::credentials::StoreResult;

/// Lists are ordered newest first.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn list_all(&self) -> StoreResult<Vec<Ticket>>;

    /// Tickets whose owner email matches case-insensitively.
    async fn list_by_owner(&self, email: &str) -> StoreResult<Vec<Ticket>>;

    async fn get(&self, id: i64) -> StoreResult<Option<Ticket>>;

    /// Insert with status [`super::STATUS_OPEN`] and the current time.
    async fn create(&self, ticket: &NewTicket) -> StoreResult<Ticket>;

    /// Store a technician response and mark the ticket answered.
    async fn respond(&self, id: i64, response: &str) -> StoreResult<bool>;

    async fn update_status(&self, id: i64, status: &str) -> StoreResult<bool>;
}
