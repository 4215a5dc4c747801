use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{
    session::session_cookie,
    state::AuthState,
    token,
    types::{LoginRequest, SessionResponse},
};
use crate::error::{ErrorBody, ServiceError};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = SessionResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid email or password", body = ErrorBody),
        (status = 503, description = "Credential store unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let request = payload.0;
    let principal = match auth_state
        .authentication()
        .authenticate(&request.email, &request.password)
        .await
    {
        Ok(principal) => principal,
        Err(ServiceError::AuthFailed(reason)) => {
            warn!(reason = reason.as_str(), "login rejected");
            return Err(ServiceError::AuthFailed(reason));
        }
        Err(ServiceError::StoreUnavailable(err)) => {
            error!("Credential store failed during login: {err}");
            return Err(ServiceError::StoreUnavailable(err));
        }
        Err(err) => return Err(err),
    };

    let config = auth_state.config();
    let token = token::issue(config, &principal, token::unix_now()).map_err(|err| {
        error!("Failed to issue session token: {err:#}");
        ServiceError::Internal
    })?;
    let cookie = session_cookie(config, &token).map_err(|err| {
        error!("Failed to build session cookie: {err}");
        ServiceError::Internal
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    info!("login succeeded");

    let body = SessionResponse {
        email: principal.email().to_string(),
        display_name: principal.display_name().to_string(),
        capability: principal.capability().to_string(),
        is_technician: auth_state.resolver().is_technician(&principal),
    };
    Ok((StatusCode::OK, headers, Json(body)))
}
