//! Small helpers for credential input validation.

use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Normalize an email for lookups: trimmed and lowercased.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-trimmed input.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email))
}

/// At least [`MIN_PASSWORD_LEN`] characters with one letter and one digit.
#[must_use]
pub fn strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("a b@example.com"));
    }

    #[test]
    fn strong_password_requires_letter_digit_and_length() {
        assert!(strong_password("abcdefg1"));
        assert!(strong_password("ção12345"));
        assert!(!strong_password("abc123"));
        assert!(!strong_password("abcdefgh"));
        assert!(!strong_password("12345678"));
    }
}
