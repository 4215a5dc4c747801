//! Login and registration against a [`CredentialStore`].

use std::sync::Arc;
use tracing::{debug, field, info, warn, Instrument, Span};

use super::hashing::{hash_secret, verify_secret, LegacyPlaintext, PasswordMatch};
use super::models::{CreateOutcome, NewCredential, Profile};
use super::store::CredentialStore;
use super::utils::{normalize_email, strong_password, valid_email, MIN_PASSWORD_LEN};
use crate::authz::CapabilityOverrides;
use crate::error::{AuthFailure, ServiceError};
use crate::principal::Principal;

pub const DEFAULT_USER_CAPABILITY: &str = "Usuario";

/// Input collected by the registration form.
#[derive(Clone, Debug, Default)]
pub struct Registration {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
}

pub struct AuthenticationService {
    store: Arc<dyn CredentialStore>,
    overrides: CapabilityOverrides,
    user_capability: String,
    legacy: LegacyPlaintext,
    span: Span,
}

impl AuthenticationService {
    /// `span` is the parent of every span this service opens.
    #[must_use]
    pub fn new(store: Arc<dyn CredentialStore>, span: Span) -> Self {
        Self {
            store,
            overrides: CapabilityOverrides::default(),
            user_capability: DEFAULT_USER_CAPABILITY.to_string(),
            legacy: LegacyPlaintext::default(),
            span,
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: CapabilityOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Capability given to principals whose profile carries no tag.
    #[must_use]
    pub fn with_user_capability(mut self, capability: impl Into<String>) -> Self {
        self.user_capability = capability.into();
        self
    }

    /// Which stored values may still be compared as plaintext.
    #[must_use]
    pub fn with_legacy_plaintext(mut self, legacy: LegacyPlaintext) -> Self {
        self.legacy = legacy;
        self
    }

    /// Verify `secret` for `email` and build the session principal.
    ///
    /// A row still holding the plaintext password is rewritten to the digest
    /// before returning; a failed rewrite is logged and the login succeeds.
    ///
    /// # Errors
    /// `Validation` on blank input, `AuthFailed` on unknown email or wrong
    /// password, `StoreUnavailable` when the store cannot be read.
    pub async fn authenticate(&self, email: &str, secret: &str) -> Result<Principal, ServiceError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::validation("email", "Email is required"));
        }
        if secret.is_empty() {
            return Err(ServiceError::validation("password", "Password is required"));
        }

        let span = tracing::info_span!(
            parent: &self.span,
            "authenticate",
            outcome = field::Empty
        );
        async move {
            let result = self.verify(email, secret).await;
            let outcome = match &result {
                Ok(_) => "ok",
                Err(ServiceError::AuthFailed(reason)) => reason.as_str(),
                Err(_) => "error",
            };
            Span::current().record("outcome", outcome);
            result
        }
        .instrument(span)
        .await
    }

    async fn verify(&self, email: &str, secret: &str) -> Result<Principal, ServiceError> {
        let Some(stored) = self.store.get_password_representation(email).await? else {
            debug!("no credential for login email");
            return Err(ServiceError::AuthFailed(AuthFailure::UnknownIdentity));
        };

        let secret_hash = hash_secret(secret);
        match verify_secret(&stored, secret, &secret_hash, self.legacy) {
            PasswordMatch::Hash => {}
            PasswordMatch::Legacy => self.migrate(email, &secret_hash).await,
            PasswordMatch::NoMatch => {
                return Err(ServiceError::AuthFailed(AuthFailure::Mismatch));
            }
        }

        let Some(profile) = self.store.get_profile(email).await? else {
            // Row removed between the two reads.
            return Err(ServiceError::AuthFailed(AuthFailure::UnknownIdentity));
        };
        Ok(self.principal_for(email, profile))
    }

    async fn migrate(&self, email: &str, secret_hash: &str) {
        let span = tracing::info_span!(parent: &self.span, "migrate_legacy_password");
        let result = self
            .store
            .update_password_representation(email, secret_hash)
            .instrument(span.clone())
            .await;
        span.in_scope(|| match result {
            Ok(true) => info!("legacy password migrated to digest"),
            Ok(false) => warn!("legacy password migration matched no row"),
            Err(err) => warn!("legacy password migration failed: {err}"),
        });
    }

    fn principal_for(&self, email: &str, profile: Profile) -> Principal {
        let display_name = profile
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| profile.email.clone());

        let capability = match self.overrides.get(email) {
            Some(forced) => forced.to_string(),
            None => profile
                .capability_tag
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .unwrap_or_else(|| self.user_capability.clone()),
        };

        Principal::new(profile.email, display_name, capability)
    }

    /// Create a credential with the password stored as a digest.
    ///
    /// # Errors
    /// `Validation` on bad input, `Conflict` when the email is taken,
    /// `StoreUnavailable` on store failures.
    pub async fn register(&self, registration: &Registration) -> Result<(), ServiceError> {
        let email = registration.email.trim();
        let name = registration.name.trim();
        validate_registration(email, name, registration)?;

        let span = tracing::info_span!(parent: &self.span, "register");
        async move {
            if self.store.exists_by_email(email).await? {
                return Err(ServiceError::Conflict("Email already registered".to_string()));
            }

            let credential = NewCredential {
                email: email.to_string(),
                password_hash: hash_secret(&registration.password),
                display_name: name.to_string(),
            };
            match self.store.create(&credential).await? {
                CreateOutcome::Created => {
                    info!("credential created");
                    Ok(())
                }
                CreateOutcome::Conflict => {
                    Err(ServiceError::Conflict("Email already registered".to_string()))
                }
            }
        }
        .instrument(span)
        .await
    }
}

fn validate_registration(
    email: &str,
    name: &str,
    registration: &Registration,
) -> Result<(), ServiceError> {
    if email.is_empty() {
        return Err(ServiceError::validation("email", "Email is required"));
    }
    if !valid_email(&normalize_email(email)) {
        return Err(ServiceError::validation("email", "Email is not valid"));
    }
    if name.is_empty() {
        return Err(ServiceError::validation("name", "Name is required"));
    }
    if registration.password.is_empty() {
        return Err(ServiceError::validation("password", "Password is required"));
    }
    if !strong_password(&registration.password) {
        return Err(ServiceError::validation(
            "password",
            format!(
                "Password must have at least {MIN_PASSWORD_LEN} characters, including letters and numbers"
            ),
        ));
    }
    if registration.password != registration.confirm_password {
        return Err(ServiceError::validation(
            "confirm_password",
            "Passwords do not match",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::memory::MemoryCredentialStore;
    use anyhow::Result;

    fn service(store: &Arc<MemoryCredentialStore>) -> AuthenticationService {
        AuthenticationService::new(store.clone(), Span::none())
    }

    fn seeded(password: &str, name: Option<&str>, tag: Option<&str>) -> Result<Arc<MemoryCredentialStore>> {
        let store = Arc::new(MemoryCredentialStore::new());
        store.insert("ana@example.com", password, name, tag)?;
        Ok(store)
    }

    #[tokio::test]
    async fn hashed_password_logs_in_without_writes() -> Result<()> {
        let store = seeded(&hash_secret("abc12345"), Some("Ana"), Some("Tecnico"))?;
        let principal = service(&store)
            .authenticate(" ANA@example.com ", "abc12345")
            .await?;

        assert_eq!(principal.email(), "ana@example.com");
        assert_eq!(principal.display_name(), "Ana");
        assert_eq!(principal.capability(), "Tecnico");
        assert_eq!(store.password_writes(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn legacy_password_is_migrated_once() -> Result<()> {
        let store = seeded("abc12345", Some("Ana"), None)?;
        let auth = service(&store);

        auth.authenticate("ana@example.com", "abc12345").await?;
        assert_eq!(
            store.get_password_representation("ana@example.com").await?,
            Some(hash_secret("abc12345"))
        );
        assert_eq!(store.password_writes(), 1);

        auth.authenticate("ana@example.com", "abc12345").await?;
        assert_eq!(store.password_writes(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_migration_still_logs_in() -> Result<()> {
        let store = seeded("abc12345", None, None)?;
        store.set_fail_writes(true);

        let principal = service(&store)
            .authenticate("ana@example.com", "abc12345")
            .await?;
        assert_eq!(principal.email(), "ana@example.com");
        assert_eq!(
            store.get_password_representation("ana@example.com").await?,
            Some("abc12345".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_alike() -> Result<()> {
        let store = seeded(&hash_secret("abc12345"), None, None)?;
        let auth = service(&store);

        let unknown = auth.authenticate("bob@example.com", "abc12345").await;
        assert!(matches!(
            unknown,
            Err(ServiceError::AuthFailed(AuthFailure::UnknownIdentity))
        ));

        let mismatch = auth.authenticate("ana@example.com", "ABC12345").await;
        assert!(matches!(
            mismatch,
            Err(ServiceError::AuthFailed(AuthFailure::Mismatch))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn digest_shaped_legacy_password_is_migrated() -> Result<()> {
        let plaintext = hash_secret("abc12345");
        let store = seeded(&plaintext, None, None)?;
        service(&store)
            .authenticate("ana@example.com", &plaintext)
            .await?;
        assert_eq!(
            store.get_password_representation("ana@example.com").await?,
            Some(hash_secret(&plaintext))
        );
        assert_eq!(store.password_writes(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn non_digest_policy_rejects_stored_digest_as_password() -> Result<()> {
        let digest = hash_secret("abc12345");
        let store = seeded(&digest, None, None)?;
        let result = service(&store)
            .with_legacy_plaintext(LegacyPlaintext::NonDigest)
            .authenticate("ana@example.com", &digest)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::AuthFailed(AuthFailure::Mismatch))
        ));
        assert_eq!(store.password_writes(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn blank_profile_fields_fall_back() -> Result<()> {
        let store = seeded(&hash_secret("abc12345"), Some("  "), Some(""))?;
        let principal = service(&store)
            .with_user_capability("Cliente")
            .authenticate("ana@example.com", "abc12345")
            .await?;
        assert_eq!(principal.display_name(), "ana@example.com");
        assert_eq!(principal.capability(), "Cliente");
        Ok(())
    }

    #[tokio::test]
    async fn override_replaces_stored_capability() -> Result<()> {
        let store = seeded(&hash_secret("abc12345"), Some("Ana"), Some("Usuario"))?;
        let overrides = CapabilityOverrides::parse(&["ANA@example.com=Tecnico"])?;
        let principal = service(&store)
            .with_overrides(overrides)
            .authenticate("ana@example.com", "abc12345")
            .await?;
        assert_eq!(principal.capability(), "Tecnico");
        Ok(())
    }

    #[tokio::test]
    async fn store_outage_is_not_an_auth_failure() -> Result<()> {
        let store = seeded(&hash_secret("abc12345"), None, None)?;
        store.set_fail_reads(true);
        let result = service(&store).authenticate("ana@example.com", "abc12345").await;
        assert!(matches!(result, Err(ServiceError::StoreUnavailable(_))));
        Ok(())
    }

    #[tokio::test]
    async fn blank_input_is_a_validation_error() -> Result<()> {
        let store = seeded("pw", None, None)?;
        let auth = service(&store);
        assert!(matches!(
            auth.authenticate("  ", "pw").await,
            Err(ServiceError::Validation { field: Some("email"), .. })
        ));
        assert!(matches!(
            auth.authenticate("ana@example.com", "").await,
            Err(ServiceError::Validation { field: Some("password"), .. })
        ));
        Ok(())
    }

    fn registration(email: &str, password: &str, confirm: &str) -> Registration {
        Registration {
            email: email.to_string(),
            name: "Bob".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn register_stores_digest_and_allows_login() -> Result<()> {
        let store = Arc::new(MemoryCredentialStore::new());
        let auth = service(&store);
        auth.register(&registration("bob@example.com", "hunter22x", "hunter22x"))
            .await?;

        assert_eq!(
            store.get_password_representation("bob@example.com").await?,
            Some(hash_secret("hunter22x"))
        );
        let principal = auth.authenticate("bob@example.com", "hunter22x").await?;
        assert_eq!(principal.display_name(), "Bob");
        assert_eq!(principal.capability(), DEFAULT_USER_CAPABILITY);
        Ok(())
    }

    #[tokio::test]
    async fn register_rejects_bad_input() -> Result<()> {
        let store = Arc::new(MemoryCredentialStore::new());
        let auth = service(&store);

        let cases = [
            (registration("", "hunter22x", "hunter22x"), "email"),
            (registration("bob", "hunter22x", "hunter22x"), "email"),
            (registration("bob@example.com", "short1", "short1"), "password"),
            (registration("bob@example.com", "hunter22x", "hunter22y"), "confirm_password"),
        ];
        for (input, expected) in cases {
            match auth.register(&input).await {
                Err(ServiceError::Validation { field, .. }) => assert_eq!(field, Some(expected)),
                other => panic!("expected validation error on {expected}, got {other:?}"),
            }
        }
        let mut nameless = registration("bob@example.com", "hunter22x", "hunter22x");
        nameless.name = " ".to_string();
        assert!(matches!(
            auth.register(&nameless).await,
            Err(ServiceError::Validation { field: Some("name"), .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn register_conflicts_on_existing_email() -> Result<()> {
        let store = seeded("pw", None, None)?;
        let result = service(&store)
            .register(&registration("Ana@Example.com", "hunter22x", "hunter22x"))
            .await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));
        Ok(())
    }
}
