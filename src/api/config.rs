//! Runtime settings shared by the server and its tests.

use std::path::PathBuf;

use super::handlers::{auth::AuthConfig, tickets::DEFAULT_UPLOADS_ROOT};
use crate::authz::{CapabilityOverrides, DEFAULT_TECHNICIAN_CAPABILITY};
use crate::credentials::{LegacyPlaintext, DEFAULT_USER_CAPABILITY};
use crate::notify::SmtpConfig;

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    auth: AuthConfig,
    technician_capability: String,
    user_capability: String,
    overrides: CapabilityOverrides,
    legacy_plaintext: LegacyPlaintext,
    recovery_code_length: Option<usize>,
    uploads_root: PathBuf,
    smtp: Option<SmtpConfig>,
}

impl ServiceConfig {
    #[must_use]
    pub fn new(auth: AuthConfig) -> Self {
        Self {
            auth,
            technician_capability: DEFAULT_TECHNICIAN_CAPABILITY.to_string(),
            user_capability: DEFAULT_USER_CAPABILITY.to_string(),
            overrides: CapabilityOverrides::default(),
            legacy_plaintext: LegacyPlaintext::default(),
            recovery_code_length: None,
            uploads_root: PathBuf::from(DEFAULT_UPLOADS_ROOT),
            smtp: None,
        }
    }

    #[must_use]
    pub fn with_technician_capability(mut self, capability: String) -> Self {
        self.technician_capability = capability;
        self
    }

    #[must_use]
    pub fn with_user_capability(mut self, capability: String) -> Self {
        self.user_capability = capability;
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: CapabilityOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    #[must_use]
    pub fn with_legacy_plaintext(mut self, legacy: LegacyPlaintext) -> Self {
        self.legacy_plaintext = legacy;
        self
    }

    #[must_use]
    pub fn with_recovery_code_length(mut self, length: Option<usize>) -> Self {
        self.recovery_code_length = length;
        self
    }

    #[must_use]
    pub fn with_uploads_root(mut self, root: PathBuf) -> Self {
        self.uploads_root = root;
        self
    }

    #[must_use]
    pub fn with_smtp(mut self, smtp: Option<SmtpConfig>) -> Self {
        self.smtp = smtp;
        self
    }

    #[must_use]
    pub fn auth(&self) -> &AuthConfig {
        &self.auth
    }

    #[must_use]
    pub fn technician_capability(&self) -> &str {
        &self.technician_capability
    }

    #[must_use]
    pub fn user_capability(&self) -> &str {
        &self.user_capability
    }

    #[must_use]
    pub fn overrides(&self) -> &CapabilityOverrides {
        &self.overrides
    }

    #[must_use]
    pub fn legacy_plaintext(&self) -> LegacyPlaintext {
        self.legacy_plaintext
    }

    #[must_use]
    pub fn recovery_code_length(&self) -> Option<usize> {
        self.recovery_code_length
    }

    #[must_use]
    pub fn uploads_root(&self) -> &PathBuf {
        &self.uploads_root
    }

    #[must_use]
    pub fn smtp(&self) -> Option<&SmtpConfig> {
        self.smtp.as_ref()
    }
}
