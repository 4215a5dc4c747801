//! Deciding whether a principal is a technician.
//!
//! Deployments have tagged support staff in several ways over time: the
//! profile column, a `role` claim, the long-form role claim type, and a
//! profile column holding several tags at once. Each of those is one
//! [`CapabilityStrategy`]; the resolver tries them in order and stops at the
//! first match.

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::credentials::utils::normalize_email;
use crate::principal::Principal;

pub const DEFAULT_TECHNICIAN_CAPABILITY: &str = "Tecnico";
pub const ROLE_CLAIM: &str = "role";
pub const LEGACY_ROLE_CLAIM: &str = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role";

const TAG_DELIMITERS: [char; 3] = [',', ';', '|'];

/// Where a strategy reads its value from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimSource {
    /// The principal's profile capability tag.
    ProfileTag,
    /// An extra claim, looked up by name ignoring case.
    Claim(String),
}

impl ClaimSource {
    #[must_use]
    pub fn resolve<'a>(&self, principal: &'a Principal) -> Option<&'a str> {
        match self {
            Self::ProfileTag => Some(principal.capability()),
            Self::Claim(name) => principal.claim(name),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Matching {
    /// The whole value must equal the capability.
    Exact,
    /// Any trimmed segment split on `,`, `;` or `|` may equal the capability.
    Delimited,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapabilityStrategy {
    pub source: ClaimSource,
    pub matching: Matching,
}

impl CapabilityStrategy {
    #[must_use]
    pub const fn new(source: ClaimSource, matching: Matching) -> Self {
        Self { source, matching }
    }

    fn matches(&self, principal: &Principal, capability: &str) -> bool {
        let Some(value) = self.source.resolve(principal) else {
            return false;
        };
        match self.matching {
            Matching::Exact => same_capability(value, capability),
            Matching::Delimited => value
                .split(TAG_DELIMITERS)
                .map(str::trim)
                .filter(|segment| !segment.is_empty())
                .any(|segment| same_capability(segment, capability)),
        }
    }
}

fn same_capability(value: &str, capability: &str) -> bool {
    value.to_lowercase() == capability.to_lowercase()
}

/// Profile tag, `role` claim, long-form role claim, then multi-valued tag.
#[must_use]
pub fn default_strategies() -> Vec<CapabilityStrategy> {
    vec![
        CapabilityStrategy::new(ClaimSource::ProfileTag, Matching::Exact),
        CapabilityStrategy::new(ClaimSource::Claim(ROLE_CLAIM.to_string()), Matching::Exact),
        CapabilityStrategy::new(
            ClaimSource::Claim(LEGACY_ROLE_CLAIM.to_string()),
            Matching::Exact,
        ),
        CapabilityStrategy::new(ClaimSource::ProfileTag, Matching::Delimited),
    ]
}

#[derive(Clone, Debug)]
pub struct AuthorizationResolver {
    technician: String,
    strategies: Vec<CapabilityStrategy>,
}

impl Default for AuthorizationResolver {
    fn default() -> Self {
        Self::new(DEFAULT_TECHNICIAN_CAPABILITY)
    }
}

impl AuthorizationResolver {
    #[must_use]
    pub fn new(technician: impl Into<String>) -> Self {
        Self {
            technician: technician.into(),
            strategies: default_strategies(),
        }
    }

    #[must_use]
    pub fn with_strategies(mut self, strategies: Vec<CapabilityStrategy>) -> Self {
        self.strategies = strategies;
        self
    }

    #[must_use]
    pub fn technician_capability(&self) -> &str {
        &self.technician
    }

    #[must_use]
    pub fn is_technician(&self, principal: &Principal) -> bool {
        self.strategies
            .iter()
            .any(|strategy| strategy.matches(principal, &self.technician))
    }
}

/// Emails whose capability is forced regardless of the stored profile tag.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapabilityOverrides {
    entries: HashMap<String, String>,
}

impl CapabilityOverrides {
    /// Parse `email=Capability` entries; each entry may itself be a
    /// comma-separated list.
    ///
    /// # Errors
    /// Returns an error when an entry lacks `=` or either side is blank.
    pub fn parse<S: AsRef<str>>(entries: &[S]) -> Result<Self> {
        let mut parsed = HashMap::new();
        for item in entries
            .iter()
            .flat_map(|entry| entry.as_ref().split(','))
            .map(str::trim)
            .filter(|item| !item.is_empty())
        {
            let Some((email, capability)) = item.split_once('=') else {
                bail!("invalid capability override '{item}', expected email=Capability");
            };
            let (email, capability) = (email.trim(), capability.trim());
            if email.is_empty() || capability.is_empty() {
                bail!("invalid capability override '{item}', expected email=Capability");
            }
            parsed.insert(normalize_email(email), capability.to_string());
        }
        Ok(Self { entries: parsed })
    }

    #[must_use]
    pub fn get(&self, email: &str) -> Option<&str> {
        self.entries.get(&normalize_email(email)).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(tag: &str) -> Principal {
        Principal::new("u@x.com".to_string(), "U".to_string(), tag.to_string())
    }

    #[test]
    fn profile_tag_matches_ignoring_case() {
        let resolver = AuthorizationResolver::default();
        assert!(resolver.is_technician(&principal("Tecnico")));
        assert!(resolver.is_technician(&principal("TECNICO")));
        assert!(!resolver.is_technician(&principal("Usuario")));
        assert!(!resolver.is_technician(&principal("technician")));
    }

    #[test]
    fn role_claims_are_consulted() {
        let resolver = AuthorizationResolver::default();
        assert!(resolver.is_technician(&principal("Usuario").with_claim("role", "tecnico")));
        assert!(resolver.is_technician(&principal("Usuario").with_claim(LEGACY_ROLE_CLAIM, "Tecnico")));
        assert!(!resolver.is_technician(&principal("Usuario").with_claim("team", "Tecnico")));
    }

    #[test]
    fn multi_valued_tag_matches_any_segment() {
        let resolver = AuthorizationResolver::default();
        assert!(resolver.is_technician(&principal("Usuario, Tecnico")));
        assert!(resolver.is_technician(&principal("Admin;tecnico")));
        assert!(resolver.is_technician(&principal("Admin | Tecnico |")));
        assert!(!resolver.is_technician(&principal("Usuario,Tecnicos")));
        assert!(!resolver.is_technician(&principal(",;|")));
    }

    #[test]
    fn claims_are_not_split() {
        let resolver = AuthorizationResolver::default();
        assert!(!resolver.is_technician(&principal("Usuario").with_claim("role", "Admin,Tecnico")));
    }

    #[test]
    fn configured_literal_is_used() {
        let resolver = AuthorizationResolver::new("Support");
        assert!(resolver.is_technician(&principal("support")));
        assert!(!resolver.is_technician(&principal("Tecnico")));
        assert_eq!(resolver.technician_capability(), "Support");
    }

    #[test]
    fn strategies_can_be_narrowed() {
        let resolver = AuthorizationResolver::default().with_strategies(vec![CapabilityStrategy::new(
            ClaimSource::Claim(ROLE_CLAIM.to_string()),
            Matching::Exact,
        )]);
        assert!(!resolver.is_technician(&principal("Tecnico")));
        assert!(resolver.is_technician(&principal("Usuario").with_claim("Role", "Tecnico")));
    }

    #[test]
    fn overrides_parse_and_normalize() -> Result<()> {
        let overrides =
            CapabilityOverrides::parse(&["Boss@Example.com=Tecnico, ops@example.com = Tecnico", ""])?;
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides.get(" boss@example.COM"), Some("Tecnico"));
        assert_eq!(overrides.get("ops@example.com"), Some("Tecnico"));
        assert_eq!(overrides.get("other@example.com"), None);
        Ok(())
    }

    #[test]
    fn overrides_reject_malformed_entries() {
        assert!(CapabilityOverrides::parse(&["boss@example.com"]).is_err());
        assert!(CapabilityOverrides::parse(&["=Tecnico"]).is_err());
        assert!(CapabilityOverrides::parse(&["boss@example.com="]).is_err());
        let empty: [&str; 0] = [];
        assert!(CapabilityOverrides::parse(&empty).map(|o| o.is_empty()).unwrap_or(false));
    }
}
