//! Error taxonomy shared by the services and the HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Failures raised by credential and ticket stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Why an authentication attempt failed.
///
/// Only used for logs; callers always see the same [`ServiceError::AuthFailed`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthFailure {
    UnknownIdentity,
    Mismatch,
}

impl AuthFailure {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownIdentity => "unknown-identity",
            Self::Mismatch => "mismatch",
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{message}")]
    Validation {
        field: Option<&'static str>,
        message: String,
    },
    #[error("email not found")]
    UnknownIdentity,
    #[error("invalid email or password")]
    AuthFailed(AuthFailure),
    #[error("authentication required")]
    Unauthenticated,
    #[error("service temporarily unavailable, try again later")]
    StoreUnavailable(#[source] StoreError),
    #[error("could not deliver the recovery message, contact support")]
    NotificationFailed,
    #[error("forbidden")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal,
}

impl ServiceError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: Some(field),
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Validation {
            field: None,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownIdentity | Self::NotFound => StatusCode::NOT_FOUND,
            Self::AuthFailed(_) | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotificationFailed => StatusCode::BAD_GATEWAY,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err)
    }
}

/// JSON body returned for every error response.
#[derive(ToSchema, Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let field = match &self {
            Self::Validation { field, .. } => field.map(ToString::to_string),
            _ => None,
        };
        // Display never includes the source, so store details stay in the logs.
        let body = ErrorBody {
            error: self.to_string(),
            field,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_share_one_message() {
        let unknown = ServiceError::AuthFailed(AuthFailure::UnknownIdentity);
        let mismatch = ServiceError::AuthFailed(AuthFailure::Mismatch);
        assert_eq!(unknown.to_string(), mismatch.to_string());
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_errors_are_not_exposed() {
        let err = ServiceError::from(StoreError::Unavailable("pg at 10.0.0.3 down".to_string()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let err = ServiceError::validation("email", "Email is required");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Email is required");
    }

    #[test]
    fn auth_failure_labels() {
        assert_eq!(AuthFailure::UnknownIdentity.as_str(), "unknown-identity");
        assert_eq!(AuthFailure::Mismatch.as_str(), "mismatch");
    }
}
