//! Auth state and session configuration.

use secrecy::{ExposeSecret, SecretString};

use crate::authz::AuthorizationResolver;
use crate::credentials::AuthenticationService;
use crate::recovery::RecoveryService;

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 8 * 60 * 60;
pub const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    session_secret: SecretString,
    session_ttl_seconds: i64,
    session_cookie_secure: bool,
}

impl AuthConfig {
    #[must_use]
    pub fn new(session_secret: SecretString) -> Self {
        Self {
            session_secret,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            session_cookie_secure: false,
        }
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    /// Mark cookies `Secure`; enable when served over HTTPS.
    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    pub(super) fn session_key(&self) -> &[u8] {
        self.session_secret.expose_secret().as_bytes()
    }
}

pub struct AuthState {
    config: AuthConfig,
    authentication: AuthenticationService,
    recovery: RecoveryService,
    resolver: AuthorizationResolver,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        authentication: AuthenticationService,
        recovery: RecoveryService,
        resolver: AuthorizationResolver,
    ) -> Self {
        Self {
            config,
            authentication,
            recovery,
            resolver,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn authentication(&self) -> &AuthenticationService {
        &self.authentication
    }

    #[must_use]
    pub fn recovery(&self) -> &RecoveryService {
        &self.recovery
    }

    #[must_use]
    pub fn resolver(&self) -> &AuthorizationResolver {
        &self.resolver
    }
}
