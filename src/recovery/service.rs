//! Recovery code lifecycle and password reset.

use std::sync::Arc;
use tracing::{error, info, Instrument, Span};

use super::code::generate_code;
use crate::credentials::utils::{strong_password, MIN_PASSWORD_LEN};
use crate::credentials::{hash_secret, CredentialStore};
use crate::error::ServiceError;
use crate::notify::Notifier;

const RECOVERY_SUBJECT: &str = "Password recovery code";

/// Input collected by the reset form.
#[derive(Clone, Debug, Default)]
pub struct PasswordReset {
    pub email: String,
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

pub struct RecoveryService {
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    code_length: Option<usize>,
    span: Span,
}

impl RecoveryService {
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, notifier: Arc<dyn Notifier>, span: Span) -> Self {
        Self {
            store,
            notifier,
            code_length: None,
            span,
        }
    }

    /// Requested code length; see [`super::code::effective_length`].
    #[must_use]
    pub fn with_code_length(mut self, length: Option<usize>) -> Self {
        self.code_length = length;
        self
    }

    /// Store `code`, replacing any previous one.
    ///
    /// # Errors
    /// `UnknownIdentity` when no credential matches, `StoreUnavailable` on
    /// store failures.
    pub async fn set_recovery_code(&self, email: &str, code: &str) -> Result<(), ServiceError> {
        if self.store.update_recovery_code(email, Some(code)).await? {
            Ok(())
        } else {
            Err(ServiceError::UnknownIdentity)
        }
    }

    /// Exact comparison with the stored code; `false` when none is stored.
    ///
    /// # Errors
    /// `StoreUnavailable` on store failures.
    pub async fn verify_recovery_code(&self, email: &str, supplied: &str) -> Result<bool, ServiceError> {
        let stored = self.store.get_recovery_code(email).await?;
        Ok(stored.is_some_and(|code| code == supplied))
    }

    /// Rewrite the password digest and clear the recovery code together.
    ///
    /// # Errors
    /// `UnknownIdentity` when no credential matches, `StoreUnavailable` on
    /// store failures.
    pub async fn reset_password(&self, email: &str, new_hash: &str) -> Result<(), ServiceError> {
        if self.store.reset_password(email, new_hash).await? {
            Ok(())
        } else {
            Err(ServiceError::UnknownIdentity)
        }
    }

    /// Issue a fresh code for `email` and send it.
    ///
    /// Unlike login, an unknown email is reported as such. When delivery fails
    /// the stored code stays valid.
    ///
    /// # Errors
    /// `Validation`, `UnknownIdentity`, `StoreUnavailable` or
    /// `NotificationFailed`.
    pub async fn request_recovery(&self, email: &str) -> Result<(), ServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::validation("email", "Email is required"));
        }

        let span = tracing::info_span!(parent: &self.span, "request_recovery");
        async move {
            if !self.store.exists_by_email(email).await? {
                return Err(ServiceError::UnknownIdentity);
            }

            let code = generate_code(self.code_length);
            self.set_recovery_code(email, &code).await?;

            let body = recovery_message(&code);
            if let Err(err) = self.notifier.send_message(email, RECOVERY_SUBJECT, &body).await {
                error!("failed to deliver recovery code: {err:#}");
                return Err(ServiceError::NotificationFailed);
            }
            info!("recovery code issued");
            Ok(())
        }
        .instrument(span)
        .await
    }

    /// Check the code and replace the password.
    ///
    /// # Errors
    /// `Validation` for missing or weak input and for a wrong code,
    /// `UnknownIdentity` if the credential vanished, `StoreUnavailable` on
    /// store failures.
    pub async fn complete_reset(&self, reset: &PasswordReset) -> Result<(), ServiceError> {
        let email = reset.email.trim();
        let code = reset.code.trim();
        if email.is_empty() || code.is_empty() {
            return Err(ServiceError::invalid("Email and code are required"));
        }
        if reset.new_password.is_empty() || reset.confirm_password.is_empty() {
            return Err(ServiceError::validation(
                "new_password",
                "New password and confirmation are required",
            ));
        }
        if reset.new_password != reset.confirm_password {
            return Err(ServiceError::validation(
                "confirm_password",
                "Passwords do not match",
            ));
        }
        if !strong_password(&reset.new_password) {
            return Err(ServiceError::validation(
                "new_password",
                format!(
                    "Password must have at least {MIN_PASSWORD_LEN} characters, including letters and numbers"
                ),
            ));
        }

        let span = tracing::info_span!(parent: &self.span, "complete_reset");
        async move {
            if !self.verify_recovery_code(email, code).await? {
                return Err(ServiceError::validation("code", "Invalid recovery code"));
            }
            self.reset_password(email, &hash_secret(&reset.new_password))
                .await?;
            info!("password reset");
            Ok(())
        }
        .instrument(span)
        .await
    }
}

fn recovery_message(code: &str) -> String {
    format!(
        "Hello,\n\n\
         You asked to reset your password. Use the code below to choose a new one.\n\n\
         Code: {code}\n\n\
         The code stays valid until it is used or a new one is requested.\n\n\
         If you did not ask for this, ignore this message.\n\n\
         Support team\n"
    )
}
