//! Ticket list, detail, creation and technician updates.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info};

use super::{
    state::TicketState,
    types::{CreateTicketRequest, RespondTicketRequest, TicketResponse, UpdateStatusRequest},
};
use crate::api::handlers::auth::{OptionalPrincipal, RequirePrincipal};
use crate::credentials::utils::valid_email;
use crate::error::{ErrorBody, ServiceError};
use crate::tickets::NewTicket;

const MAX_STATUS_LEN: usize = 50;

fn log_store_failure(err: &ServiceError) {
    if let ServiceError::StoreUnavailable(source) = err {
        error!("Ticket store failed: {source}");
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[utoipa::path(
    get,
    path = "/v1/tickets",
    responses(
        (status = 200, description = "Tickets visible to the caller, newest first", body = [TicketResponse]),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 503, description = "Ticket store unavailable", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn list_tickets(
    RequirePrincipal(principal): RequirePrincipal,
    state: Extension<Arc<TicketState>>,
) -> Result<impl IntoResponse, ServiceError> {
    let tickets = state
        .guard()
        .visible_tickets(&principal)
        .await
        .inspect_err(log_store_failure)?;
    let body: Vec<TicketResponse> = tickets.into_iter().map(TicketResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/v1/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = TicketResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 503, description = "Ticket store unavailable", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn create_ticket(
    OptionalPrincipal(principal): OptionalPrincipal,
    state: Extension<Arc<TicketState>>,
    payload: Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = payload.0;

    let requester_name = request.requester_name.trim().to_string();
    if requester_name.is_empty() {
        return Err(ServiceError::validation("requester_name", "Name is required"));
    }
    // A logged-in caller always owns what they open.
    let email = match &principal {
        Some(principal) => principal.email().to_string(),
        None => {
            let email = request.email.trim().to_string();
            if email.is_empty() {
                return Err(ServiceError::validation("email", "Email is required"));
            }
            if !valid_email(&email) {
                return Err(ServiceError::validation("email", "Email is not valid"));
            }
            email
        }
    };
    let description = request.description.trim().to_string();
    if description.is_empty() {
        return Err(ServiceError::validation("description", "Description is required"));
    }

    let ticket = state
        .tickets()
        .create(&NewTicket {
            requester_name,
            email,
            phone: non_blank(request.phone),
            urgency: non_blank(request.urgency),
            description,
            attachment: None,
        })
        .await
        .map_err(ServiceError::from)
        .inspect_err(log_store_failure)?;

    info!(ticket.id = ticket.id, "ticket opened");
    Ok((StatusCode::CREATED, Json(TicketResponse::from(ticket))))
}

#[utoipa::path(
    get,
    path = "/v1/tickets/{id}",
    params(("id" = i64, Path, description = "Ticket id")),
    responses(
        (status = 200, description = "Ticket detail", body = TicketResponse),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 403, description = "Ticket belongs to someone else", body = ErrorBody),
        (status = 404, description = "No such ticket", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn get_ticket(
    RequirePrincipal(principal): RequirePrincipal,
    state: Extension<Arc<TicketState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ServiceError> {
    let ticket = state
        .guard()
        .view_ticket(&principal, id)
        .await
        .inspect_err(log_store_failure)?;
    Ok(Json(TicketResponse::from(ticket)))
}

#[utoipa::path(
    post,
    path = "/v1/tickets/{id}/response",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = RespondTicketRequest,
    responses(
        (status = 200, description = "Response stored, ticket answered", body = TicketResponse),
        (status = 400, description = "Empty response", body = ErrorBody),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 403, description = "Caller is not a technician", body = ErrorBody),
        (status = 404, description = "No such ticket", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn respond_ticket(
    RequirePrincipal(principal): RequirePrincipal,
    state: Extension<Arc<TicketState>>,
    Path(id): Path<i64>,
    payload: Json<RespondTicketRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.guard().ensure_respond(&principal)?;

    let response = payload.response.trim();
    if response.is_empty() {
        return Err(ServiceError::validation("response", "Response is required"));
    }
    let updated = state
        .tickets()
        .respond(id, response)
        .await
        .map_err(ServiceError::from)
        .inspect_err(log_store_failure)?;
    if !updated {
        return Err(ServiceError::NotFound);
    }

    info!(ticket.id = id, "ticket answered");
    let ticket = state
        .guard()
        .view_ticket(&principal, id)
        .await
        .inspect_err(log_store_failure)?;
    Ok(Json(TicketResponse::from(ticket)))
}

#[utoipa::path(
    put,
    path = "/v1/tickets/{id}/status",
    params(("id" = i64, Path, description = "Ticket id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TicketResponse),
        (status = 400, description = "Invalid status", body = ErrorBody),
        (status = 401, description = "No session", body = ErrorBody),
        (status = 403, description = "Caller is not a technician", body = ErrorBody),
        (status = 404, description = "No such ticket", body = ErrorBody)
    ),
    tag = "tickets"
)]
pub async fn update_status(
    RequirePrincipal(principal): RequirePrincipal,
    state: Extension<Arc<TicketState>>,
    Path(id): Path<i64>,
    payload: Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.guard().ensure_respond(&principal)?;

    let status = payload.status.trim();
    if status.is_empty() || status.chars().count() > MAX_STATUS_LEN {
        return Err(ServiceError::validation(
            "status",
            format!("Status must have between 1 and {MAX_STATUS_LEN} characters"),
        ));
    }
    let updated = state
        .tickets()
        .update_status(id, status)
        .await
        .map_err(ServiceError::from)
        .inspect_err(log_store_failure)?;
    if !updated {
        return Err(ServiceError::NotFound);
    }

    info!(ticket.id = id, status, "ticket status changed");
    let ticket = state
        .guard()
        .view_ticket(&principal, id)
        .await
        .inspect_err(log_store_failure)?;
    Ok(Json(TicketResponse::from(ticket)))
}
