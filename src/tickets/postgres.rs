//! Postgres-backed ticket store (`tickets` table).

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use tracing::Instrument;

use super::models::{NewTicket, Ticket, STATUS_ANSWERED, STATUS_OPEN};
use super::store::TicketStore;
use crate::credentials::postgres::query_span;
use crate::credentials::StoreResult;

#[derive(Clone, Debug)]
pub struct PgTicketStore {
    pool: PgPool,
}

impl PgTicketStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn ticket_from_row(row: &PgRow) -> Ticket {
    Ticket {
        id: row.get("id"),
        requester_name: row.get("requester_name"),
        email: row.get("email"),
        phone: row.get("phone"),
        urgency: row.get("urgency"),
        description: row.get("description"),
        opened_at: row.get("opened_at_unix"),
        status: row.get("status"),
        technician_response: row.get("technician_response"),
        attachment: row.get("attachment"),
    }
}

#[async_trait]
impl TicketStore for PgTicketStore {
    async fn list_all(&self) -> StoreResult<Vec<Ticket>> {
        let query = "SELECT id, requester_name, email, phone, urgency, description, \
                     EXTRACT(EPOCH FROM opened_at)::BIGINT AS opened_at_unix, status, \
                     technician_response, attachment \
                     FROM tickets ORDER BY opened_at DESC, id DESC";
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(rows.iter().map(ticket_from_row).collect())
    }

    async fn list_by_owner(&self, email: &str) -> StoreResult<Vec<Ticket>> {
        let query = "SELECT id, requester_name, email, phone, urgency, description, \
                     EXTRACT(EPOCH FROM opened_at)::BIGINT AS opened_at_unix, status, \
                     technician_response, attachment \
                     FROM tickets WHERE lower(trim(email)) = lower(trim($1)) \
                     ORDER BY opened_at DESC, id DESC";
        let rows = sqlx::query(query)
            .bind(email)
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(rows.iter().map(ticket_from_row).collect())
    }

    async fn get(&self, id: i64) -> StoreResult<Option<Ticket>> {
        let query = "SELECT id, requester_name, email, phone, urgency, description, \
                     EXTRACT(EPOCH FROM opened_at)::BIGINT AS opened_at_unix, status, \
                     technician_response, attachment \
                     FROM tickets WHERE id = $1";
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(row.as_ref().map(ticket_from_row))
    }

    async fn create(&self, ticket: &NewTicket) -> StoreResult<Ticket> {
        let query = "INSERT INTO tickets \
                     (requester_name, email, phone, urgency, description, status, attachment) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7) \
                     RETURNING id, requester_name, email, phone, urgency, description, \
                     EXTRACT(EPOCH FROM opened_at)::BIGINT AS opened_at_unix, status, \
                     technician_response, attachment";
        let row = sqlx::query(query)
            .bind(&ticket.requester_name)
            .bind(&ticket.email)
            .bind(&ticket.phone)
            .bind(&ticket.urgency)
            .bind(&ticket.description)
            .bind(STATUS_OPEN)
            .bind(&ticket.attachment)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", query))
            .await?;
        Ok(ticket_from_row(&row))
    }

    async fn respond(&self, id: i64, response: &str) -> StoreResult<bool> {
        let query = "UPDATE tickets SET technician_response = $2, status = $3 WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .bind(response)
            .bind(STATUS_ANSWERED)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(&self, id: i64, status: &str) -> StoreResult<bool> {
        let query = "UPDATE tickets SET status = $2 WHERE id = $1";
        let result = sqlx::query(query)
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
