//! Session endpoints and cookie handling.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::{principal::OptionalPrincipal, state::AuthConfig, state::AuthState, types::SessionResponse};

pub const SESSION_COOKIE_NAME: &str = "ticketdesk_session";

#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionResponse),
        (status = 204, description = "No active session")
    ),
    tag = "auth"
)]
pub async fn session(
    OptionalPrincipal(principal): OptionalPrincipal,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(principal) = principal else {
        return StatusCode::NO_CONTENT.into_response();
    };
    let response = SessionResponse {
        email: principal.email().to_string(),
        display_name: principal.display_name().to_string(),
        capability: principal.capability().to_string(),
        is_technician: auth_state.resolver().is_technician(&principal),
    };
    (StatusCode::OK, Json(response)).into_response()
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Tokens are stateless; clearing the cookie is all there is to do.
    let mut response_headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build logout cookie: {err}"),
    }
    (StatusCode::NO_CONTENT, response_headers).into_response()
}

/// Build the `HttpOnly` session cookie.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty() {
                return Some(val.trim().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(secure: bool) -> AuthConfig {
        AuthConfig::new(SecretString::from("0123456789abcdef0123456789abcdef"))
            .with_session_cookie_secure(secure)
    }

    #[test]
    fn cookie_attributes() -> anyhow::Result<()> {
        let cookie = session_cookie(&config(false), "tok")?;
        assert_eq!(
            cookie.to_str()?,
            "ticketdesk_session=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=28800"
        );
        let cookie = session_cookie(&config(true), "tok")?;
        assert!(cookie.to_str()?.ends_with("; Secure"));
        let cleared = clear_session_cookie(&config(false))?;
        assert!(cleared.to_str()?.contains("Max-Age=0"));
        Ok(())
    }

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; ticketdesk_session=abc.def ; lang=pt"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn empty_or_missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("ticketdesk_session="));
        assert_eq!(extract_session_token(&headers), None);
    }
}
