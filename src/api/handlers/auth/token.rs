//! Signed session tokens.
//!
//! Token format: `base64url(json claims) "." base64url(hmac-sha256)`. The MAC
//! covers the encoded payload, so nothing is parsed before it is checked.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use super::state::AuthConfig;
use crate::principal::Principal;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub principal: Principal,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl SessionClaims {
    /// Sliding renewal: re-issue once less than half the TTL is left.
    #[must_use]
    pub fn needs_renewal(&self, now: i64, ttl_seconds: i64) -> bool {
        self.expires_at - now < ttl_seconds / 2
    }
}

pub(crate) fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_secs()).unwrap_or(i64::MAX))
}

fn mac(config: &AuthConfig) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(config.session_key()).context("invalid session key")
}

/// Issue a token for `principal` valid for the configured TTL from `now`.
///
/// # Errors
/// Returns an error if the claims cannot be serialized or the key is unusable.
pub fn issue(config: &AuthConfig, principal: &Principal, now: i64) -> Result<String> {
    let claims = SessionClaims {
        principal: principal.clone(),
        issued_at: now,
        expires_at: now.saturating_add(config.session_ttl_seconds()),
    };
    let payload = serde_json::to_vec(&claims).context("failed to encode session claims")?;
    let payload = Base64UrlUnpadded::encode_string(&payload);

    let mut mac = mac(config)?;
    mac.update(payload.as_bytes());
    let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());
    Ok(format!("{payload}.{signature}"))
}

/// Return the claims of a well-formed, correctly signed, unexpired token.
#[must_use]
pub fn verify(config: &AuthConfig, token: &str, now: i64) -> Option<SessionClaims> {
    let (payload, signature) = token.trim().split_once('.')?;
    let signature = Base64UrlUnpadded::decode_vec(signature).ok()?;

    let mut mac = mac(config).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;

    let payload = Base64UrlUnpadded::decode_vec(payload).ok()?;
    let claims: SessionClaims = serde_json::from_slice(&payload).ok()?;
    (claims.expires_at > now).then_some(claims)
}
