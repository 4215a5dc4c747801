use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use tracing::error;

use super::{
    state::AuthState,
    types::{MessageResponse, RecoveryRequest, ResetPasswordRequest},
};
use crate::error::{ErrorBody, ServiceError};
use crate::recovery::PasswordReset;

fn log_store_failure(err: &ServiceError) {
    if let ServiceError::StoreUnavailable(source) = err {
        error!("Credential store failed during recovery: {source}");
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/recovery",
    request_body = RecoveryRequest,
    responses(
        (status = 202, description = "Recovery code sent", body = MessageResponse),
        (status = 400, description = "Missing email", body = ErrorBody),
        (status = 404, description = "Email not found", body = ErrorBody),
        (status = 502, description = "Code stored but could not be delivered", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn request_recovery(
    auth_state: Extension<Arc<AuthState>>,
    payload: Json<RecoveryRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    auth_state
        .recovery()
        .request_recovery(&payload.email)
        .await
        .inspect_err(log_store_failure)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Recovery code sent to the given email".to_string(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/v1/auth/recovery/reset",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid input or recovery code", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    auth_state: Extension<Arc<AuthState>>,
    payload: Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = payload.0;
    let reset = PasswordReset {
        email: request.email,
        code: request.code,
        new_password: request.new_password,
        confirm_password: request.confirm_password,
    };
    auth_state
        .recovery()
        .complete_reset(&reset)
        .await
        .inspect_err(log_store_failure)?;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Password changed, log in with the new password".to_string(),
        }),
    ))
}
