//! Storage seam for credentials.
//!
//! Every lookup takes the caller's email as typed; implementations match it
//! case-insensitively after trimming. Writes report whether a row was hit so
//! the services can tell a missing identity from a successful update.

use async_trait::async_trait;

use super::models::{CreateOutcome, NewCredential, Profile};
use crate::error::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Stored password representation (digest or legacy plaintext).
    async fn get_password_representation(&self, email: &str) -> StoreResult<Option<String>>;

    async fn get_profile(&self, email: &str) -> StoreResult<Option<Profile>>;

    async fn update_password_representation(&self, email: &str, value: &str) -> StoreResult<bool>;

    /// Set or clear (`None`) the recovery code.
    async fn update_recovery_code(&self, email: &str, code: Option<&str>) -> StoreResult<bool>;

    async fn get_recovery_code(&self, email: &str) -> StoreResult<Option<String>>;

    /// Rewrite the password and clear the recovery code in one statement.
    async fn reset_password(&self, email: &str, password_hash: &str) -> StoreResult<bool>;

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool>;

    async fn create(&self, credential: &NewCredential) -> StoreResult<CreateOutcome>;

    /// Cheap connectivity probe for `/health`.
    async fn ping(&self) -> StoreResult<()>;
}
