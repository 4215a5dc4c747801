//! Ticket-level permissions.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn, Instrument, Span};

use super::capability::AuthorizationResolver;
use crate::error::ServiceError;
use crate::principal::Principal;
use crate::tickets::{Ticket, TicketStore};

pub const UPLOADS_SEGMENT: &str = "uploads";

/// A requested attachment path after normalization.
///
/// Always of the form `/uploads/<segment>[/<segment>...]` with no `.` or `..`
/// segments, so it can be joined onto the web root without escaping it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentPath {
    segments: Vec<String>,
}

impl AttachmentPath {
    /// `/uploads/...` with forward slashes.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Relative filesystem path, starting with `uploads`.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Exact, case-sensitive match below the `uploads` prefix.
    fn same_as(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

/// Normalize a raw attachment path.
///
/// Backslashes become slashes, surrounding whitespace is dropped, and empty
/// or `.` segments are skipped. Returns `None` for any `..` segment, a first
/// segment other than `uploads`, or no file segment after it.
#[must_use]
pub fn normalize_attachment_path(raw: &str) -> Option<AttachmentPath> {
    let replaced = raw.replace('\\', "/");
    let mut segments = Vec::new();
    for segment in replaced.trim().split('/') {
        match segment {
            "" | "." => {}
            ".." => return None,
            s if s.contains('\0') => return None,
            s => segments.push(s.to_string()),
        }
    }

    let first = segments.first()?;
    if !first.eq_ignore_ascii_case(UPLOADS_SEGMENT) || segments.len() < 2 {
        return None;
    }
    segments[0] = UPLOADS_SEGMENT.to_string();
    Some(AttachmentPath { segments })
}

/// Applies the technician decision to ticket operations.
pub struct TicketAccessGuard {
    resolver: AuthorizationResolver,
    tickets: Arc<dyn TicketStore>,
    span: Span,
}

impl TicketAccessGuard {
    #[must_use]
    pub fn new(resolver: AuthorizationResolver, tickets: Arc<dyn TicketStore>, span: Span) -> Self {
        Self {
            resolver,
            tickets,
            span,
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &AuthorizationResolver {
        &self.resolver
    }

    #[must_use]
    pub fn is_technician(&self, principal: &Principal) -> bool {
        self.resolver.is_technician(principal)
    }

    /// Every ticket for technicians, otherwise only the caller's own.
    ///
    /// # Errors
    /// `StoreUnavailable` when the ticket store fails.
    pub async fn visible_tickets(&self, principal: &Principal) -> Result<Vec<Ticket>, ServiceError> {
        let technician = self.is_technician(principal);
        let span = tracing::info_span!(parent: &self.span, "visible_tickets", technician);
        let tickets = if technician {
            self.tickets.list_all().instrument(span).await?
        } else {
            self.tickets
                .list_by_owner(principal.email())
                .instrument(span)
                .await?
        };
        Ok(tickets)
    }

    #[must_use]
    pub fn can_view(&self, principal: &Principal, ticket: &Ticket) -> bool {
        self.is_technician(principal) || principal.owns(&ticket.email)
    }

    /// Load a ticket the caller may see.
    ///
    /// # Errors
    /// `NotFound` for a missing id, `Forbidden` for someone else's ticket,
    /// `StoreUnavailable` when the ticket store fails.
    pub async fn view_ticket(&self, principal: &Principal, id: i64) -> Result<Ticket, ServiceError> {
        let span = tracing::info_span!(parent: &self.span, "view_ticket", ticket.id = id);
        let Some(ticket) = self.tickets.get(id).instrument(span.clone()).await? else {
            return Err(ServiceError::NotFound);
        };
        if self.can_view(principal, &ticket) {
            Ok(ticket)
        } else {
            span.in_scope(|| warn!("ticket view denied"));
            Err(ServiceError::Forbidden)
        }
    }

    /// Responding and changing status are technician-only.
    ///
    /// # Errors
    /// `Forbidden` for everyone else.
    pub fn ensure_respond(&self, principal: &Principal) -> Result<(), ServiceError> {
        if self.is_technician(principal) {
            Ok(())
        } else {
            self.span.in_scope(|| warn!("ticket mutation denied"));
            Err(ServiceError::Forbidden)
        }
    }

    /// Check an attachment download and return the normalized path.
    ///
    /// # Errors
    /// `NotFound` when the path is malformed or outside the uploads area,
    /// `Forbidden` when a non-technician does not own a ticket referencing it,
    /// `StoreUnavailable` when the ticket store fails.
    pub async fn authorize_download(
        &self,
        principal: &Principal,
        raw_path: &str,
    ) -> Result<AttachmentPath, ServiceError> {
        let span = tracing::info_span!(parent: &self.span, "authorize_download");
        let Some(requested) = normalize_attachment_path(raw_path) else {
            span.in_scope(|| debug!("attachment path rejected"));
            return Err(ServiceError::NotFound);
        };
        if self.is_technician(principal) {
            return Ok(requested);
        }

        let owned = self
            .tickets
            .list_by_owner(principal.email())
            .instrument(span.clone())
            .await?;
        let referenced = owned
            .iter()
            .filter_map(|ticket| ticket.attachment.as_deref())
            .filter_map(normalize_attachment_path)
            .any(|path| path.same_as(&requested));

        if referenced {
            Ok(requested)
        } else {
            span.in_scope(|| warn!("attachment download denied"));
            Err(ServiceError::Forbidden)
        }
    }
}
