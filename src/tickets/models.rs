//! Ticket records.

/// Status given to new tickets.
pub const STATUS_OPEN: &str = "Aberto";
/// Status set when a technician responds.
pub const STATUS_ANSWERED: &str = "Respondido";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub id: i64,
    pub requester_name: String,
    /// Owner; never changes after creation.
    pub email: String,
    pub phone: Option<String>,
    pub urgency: Option<String>,
    pub description: String,
    /// Unix seconds.
    pub opened_at: i64,
    pub status: String,
    pub technician_response: Option<String>,
    /// Stored path such as `/uploads/<file>`.
    pub attachment: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct NewTicket {
    pub requester_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub urgency: Option<String>,
    pub description: String,
    pub attachment: Option<String>,
}
