//! Session middleware and principal extraction.
//!
//! Flow: the middleware reads the session cookie, checks its signature and
//! expiry, and stores the [`Principal`] in the request extensions. Handlers
//! pull it out with [`RequirePrincipal`] (401 when absent) or
//! [`OptionalPrincipal`]. Past half of its lifetime the cookie is re-issued
//! on the way out.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::SET_COOKIE, request::Parts},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{debug, error};

use super::session::{extract_session_token, session_cookie};
use super::state::AuthState;
use super::token;
use crate::error::ServiceError;
use crate::principal::Principal;

/// Resolve the session cookie and renew it when it is getting old.
pub async fn session_layer(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let config = auth_state.config();
    let now = token::unix_now();
    let mut renewal = None;

    if let Some(raw) = extract_session_token(request.headers()) {
        match token::verify(config, &raw, now) {
            Some(claims) => {
                if claims.needs_renewal(now, config.session_ttl_seconds()) {
                    match token::issue(config, &claims.principal, now) {
                        Ok(renewed) => renewal = Some(renewed),
                        Err(err) => error!("Failed to renew session token: {err}"),
                    }
                }
                request.extensions_mut().insert(claims.principal);
            }
            None => debug!("ignoring invalid or expired session cookie"),
        }
    }

    let mut response = next.run(request).await;

    // Login and logout set their own cookie.
    if let Some(renewed) = renewal {
        if !response.headers().contains_key(SET_COOKIE) {
            match session_cookie(config, &renewed) {
                Ok(cookie) => {
                    response.headers_mut().insert(SET_COOKIE, cookie);
                }
                Err(err) => error!("Failed to build renewed session cookie: {err}"),
            }
        }
    }
    response
}

/// The caller's principal; rejects with 401 when there is no valid session.
#[derive(Clone, Debug)]
pub struct RequirePrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequirePrincipal
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Self)
            .ok_or(ServiceError::Unauthenticated)
    }
}

/// The caller's principal if there is a valid session.
#[derive(Clone, Debug)]
pub struct OptionalPrincipal(pub Option<Principal>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalPrincipal
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Principal>().cloned()))
    }
}
