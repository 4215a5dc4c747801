use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;

use super::{
    state::AuthState,
    types::{MessageResponse, RegisterRequest},
};
use crate::credentials::Registration;
use crate::error::{ErrorBody, ServiceError};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = MessageResponse),
        (status = 400, description = "Invalid input", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = payload.0;
    let registration = Registration {
        email: request.email,
        name: request.name,
        password: request.password,
        confirm_password: request.confirm_password,
    };

    auth_state
        .authentication()
        .register(&registration)
        .await
        .inspect_err(|err| {
            if let ServiceError::StoreUnavailable(source) = err {
                error!("Credential store failed during registration: {source}");
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Account created".to_string(),
        }),
    ))
}
