//! Request/response types for ticket endpoints.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::tickets::Ticket;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct TicketResponse {
    pub id: i64,
    pub requester_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub urgency: Option<String>,
    pub description: String,
    /// Unix seconds.
    pub opened_at: i64,
    pub status: String,
    pub technician_response: Option<String>,
    pub attachment: Option<String>,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            requester_name: ticket.requester_name,
            email: ticket.email,
            phone: ticket.phone,
            urgency: ticket.urgency,
            description: ticket.description,
            opened_at: ticket.opened_at,
            status: ticket.status,
            technician_response: ticket.technician_response,
            attachment: ticket.attachment,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct CreateTicketRequest {
    #[serde(default)]
    pub requester_name: String,
    /// Ignored when the caller is logged in; the session email is used.
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub urgency: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct RespondTicketRequest {
    #[serde(default)]
    pub response: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

#[derive(IntoParams, Deserialize, Debug, Default)]
pub struct AttachmentQuery {
    /// Stored attachment path, e.g. `/uploads/report.pdf`.
    #[serde(default)]
    pub path: String,
}
