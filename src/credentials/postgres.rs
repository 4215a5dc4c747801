//! Postgres-backed credential store (`users` table).

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{Instrument, Span};

use super::models::{CreateOutcome, NewCredential, Profile};
use super::store::{CredentialStore, StoreResult};

#[derive(Clone, Debug)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn query_span(operation: &'static str, statement: &'static str) -> Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn get_password_representation(&self, email: &str) -> StoreResult<Option<String>> {
        let query = "SELECT password FROM users WHERE lower(email) = lower(trim($1))";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(row.map(|row| row.get("password")))
    }

    async fn get_profile(&self, email: &str) -> StoreResult<Option<Profile>> {
        let query = "SELECT email, name, profile FROM users WHERE lower(email) = lower(trim($1))";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(row.map(|row| Profile {
            email: row.get("email"),
            display_name: row.get("name"),
            capability_tag: row.get("profile"),
        }))
    }

    async fn update_password_representation(&self, email: &str, value: &str) -> StoreResult<bool> {
        let query = "UPDATE users SET password = $2 WHERE lower(email) = lower(trim($1))";
        let result = sqlx::query(query)
            .bind(email)
            .bind(value)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_recovery_code(&self, email: &str, code: Option<&str>) -> StoreResult<bool> {
        let query = "UPDATE users SET recovery_code = $2 WHERE lower(email) = lower(trim($1))";
        let result = sqlx::query(query)
            .bind(email)
            .bind(code)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_recovery_code(&self, email: &str) -> StoreResult<Option<String>> {
        let query = "SELECT recovery_code FROM users WHERE lower(email) = lower(trim($1))";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(row.and_then(|row| row.get::<Option<String>, _>("recovery_code")))
    }

    async fn reset_password(&self, email: &str, password_hash: &str) -> StoreResult<bool> {
        let query = "UPDATE users SET password = $2, recovery_code = NULL \
                     WHERE lower(email) = lower(trim($1))";
        let result = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let query = "SELECT EXISTS (SELECT 1 FROM users WHERE lower(email) = lower(trim($1)))";
        let exists: bool = sqlx::query_scalar(query)
            .bind(email)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(exists)
    }

    async fn create(&self, credential: &NewCredential) -> StoreResult<CreateOutcome> {
        let query = "INSERT INTO users (email, password, name) VALUES (trim($1), $2, $3)";
        let result = sqlx::query(query)
            .bind(&credential.email)
            .bind(&credential.password_hash)
            .bind(&credential.display_name)
            .execute(&self.pool)
            .instrument(query_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err.into()),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        let query = "SELECT 1";
        sqlx::query(query)
            .execute(&self.pool)
            .instrument(query_span("SELECT", query))
            .await?;
        Ok(())
    }
}
