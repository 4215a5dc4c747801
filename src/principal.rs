//! The identity bound to an authenticated session.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity and capability derived at login.
///
/// A principal is built once by the authentication service and then only
/// read. Extra claims come from sessions issued by older deployments and are
/// consulted by the authorization resolver.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    email: String,
    display_name: String,
    capability: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    claims: BTreeMap<String, String>,
}

impl Principal {
    #[must_use]
    pub fn new(email: String, display_name: String, capability: String) -> Self {
        Self {
            email,
            display_name,
            capability,
            claims: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_claim(mut self, name: &str, value: &str) -> Self {
        self.claims.insert(name.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The profile capability tag, e.g. `Usuario` or `Tecnico`.
    #[must_use]
    pub fn capability(&self) -> &str {
        &self.capability
    }

    /// Look up an extra claim by name, ignoring ASCII case.
    #[must_use]
    pub fn claim(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Case-insensitive email ownership check.
    #[must_use]
    pub fn owns(&self, owner_email: &str) -> bool {
        self.email.trim().eq_ignore_ascii_case(owner_email.trim())
    }
}
