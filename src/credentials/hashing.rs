//! Password digests and the pure comparison used at login.

use base64ct::{Base64, Encoding};
use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};

const DIGEST_LEN: usize = 32;

/// Outcome of comparing a supplied secret with the stored representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PasswordMatch {
    /// Stored value is the digest of the supplied secret.
    Hash,
    /// Stored value is the supplied secret itself and must be migrated.
    Legacy,
    NoMatch,
}

/// When a stored value may be compared as legacy plaintext.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LegacyPlaintext {
    /// Every stored value that is not the supplied secret's digest.
    #[default]
    Always,
    /// Only stored values that do not have the digest shape. A legacy
    /// password that happens to look like a digest can no longer log in,
    /// and a leaked digest cannot be replayed as a password.
    NonDigest,
}

impl LegacyPlaintext {
    fn allows(self, stored: &str) -> bool {
        match self {
            Self::Always => true,
            Self::NonDigest => !is_digest(stored),
        }
    }
}

impl std::str::FromStr for LegacyPlaintext {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "non-digest" => Ok(Self::NonDigest),
            other => Err(format!(
                "unknown legacy plaintext policy '{other}', expected 'always' or 'non-digest'"
            )),
        }
    }
}

/// SHA-256 of the UTF-8 secret, standard padded base64. Unsalted.
#[must_use]
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    Base64::encode_string(&hasher.finalize())
}

/// True when `value` has the exact shape produced by [`hash_secret`].
#[must_use]
pub fn is_digest(value: &str) -> bool {
    Base64::decode_vec(value).is_ok_and(|bytes| bytes.len() == DIGEST_LEN)
}

/// Compare `supplied` against `stored`, digest first, then legacy plaintext.
///
/// `secret_hash` must be `hash_secret(supplied)`; it is passed in so the
/// caller can reuse it for migration without hashing twice. `legacy` decides
/// which stored values may take the plaintext path.
#[must_use]
pub fn verify_secret(
    stored: &str,
    supplied: &str,
    secret_hash: &str,
    legacy: LegacyPlaintext,
) -> PasswordMatch {
    if constant_time_eq(stored.as_bytes(), secret_hash.as_bytes()) {
        PasswordMatch::Hash
    } else if legacy.allows(stored) && constant_time_eq(stored.as_bytes(), supplied.as_bytes()) {
        PasswordMatch::Legacy
    } else {
        PasswordMatch::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_secret_matches_known_digest() {
        assert_eq!(
            hash_secret("password"),
            "XohImNooBHFR0OVvjcYpJ3NgPQ1qq73WKhHvch0VQtg="
        );
    }

    #[test]
    fn hash_secret_of_empty_string() {
        assert_eq!(
            hash_secret(""),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        );
    }

    #[test]
    fn hash_secret_is_deterministic() {
        assert_eq!(hash_secret("s3cret-pass"), hash_secret("s3cret-pass"));
        assert_ne!(hash_secret("s3cret-pass"), hash_secret("s3cret-Pass"));
    }

    #[test]
    fn is_digest_recognizes_hash_output() {
        assert!(is_digest(&hash_secret("anything")));
        assert!(!is_digest("abc12345"));
        assert!(!is_digest(""));
        // valid base64, wrong length
        assert!(!is_digest("YWJj"));
    }

    #[test]
    fn verify_prefers_digest() {
        let digest = hash_secret("abc12345");
        assert_eq!(
            verify_secret(&digest, "abc12345", &digest, LegacyPlaintext::NonDigest),
            PasswordMatch::Hash
        );
    }

    #[test]
    fn verify_detects_legacy_plaintext() {
        let digest = hash_secret("abc12345");
        assert_eq!(
            verify_secret("abc12345", "abc12345", &digest, LegacyPlaintext::NonDigest),
            PasswordMatch::Legacy
        );
    }

    #[test]
    fn verify_is_case_sensitive() {
        let digest = hash_secret("ABC12345");
        assert_eq!(
            verify_secret("abc12345", "ABC12345", &digest, LegacyPlaintext::Always),
            PasswordMatch::NoMatch
        );
        let stored = hash_secret("abc12345");
        assert_eq!(
            verify_secret(&stored, "ABC12345", &digest, LegacyPlaintext::Always),
            PasswordMatch::NoMatch
        );
    }

    #[test]
    fn digest_shaped_plaintext_follows_policy() {
        // A legacy row whose plaintext password has the digest shape.
        let stored = hash_secret("abc12345");
        let digest_of_stored = hash_secret(&stored);
        assert_eq!(
            verify_secret(&stored, &stored, &digest_of_stored, LegacyPlaintext::Always),
            PasswordMatch::Legacy
        );
        assert_eq!(
            verify_secret(&stored, &stored, &digest_of_stored, LegacyPlaintext::NonDigest),
            PasswordMatch::NoMatch
        );
    }

    #[test]
    fn legacy_policy_parses() {
        assert_eq!("always".parse::<LegacyPlaintext>(), Ok(LegacyPlaintext::Always));
        assert_eq!(" Non-Digest ".parse::<LegacyPlaintext>(), Ok(LegacyPlaintext::NonDigest));
        assert!("never".parse::<LegacyPlaintext>().is_err());
        assert_eq!(LegacyPlaintext::default(), LegacyPlaintext::Always);
    }
}
