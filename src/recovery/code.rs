//! Numeric recovery code generation.

use rand::{rngs::OsRng, Rng};

pub const DEFAULT_CODE_LEN: usize = 6;
pub const MIN_CODE_LEN: usize = 4;

/// Length actually used for a requested code length.
///
/// `None` (unset or unparsable configuration) means [`DEFAULT_CODE_LEN`];
/// anything shorter than [`MIN_CODE_LEN`] is raised to it.
#[must_use]
pub fn effective_length(requested: Option<usize>) -> usize {
    requested.map_or(DEFAULT_CODE_LEN, |len| len.max(MIN_CODE_LEN))
}

/// Generate a string of uniformly random decimal digits from the OS RNG.
#[must_use]
pub fn generate_code(requested: Option<usize>) -> String {
    generate_code_with_rng(&mut OsRng, requested)
}

fn generate_code_with_rng<R: Rng + ?Sized>(rng: &mut R, requested: Option<usize>) -> String {
    (0..effective_length(requested))
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn short_requests_are_raised_to_minimum() {
        assert_eq!(generate_code(Some(3)).len(), 4);
        assert_eq!(generate_code(Some(0)).len(), 4);
    }

    #[test]
    fn default_length_is_six() {
        assert_eq!(generate_code(None).len(), 6);
        assert_eq!(generate_code(Some(8)).len(), 8);
    }

    #[test]
    fn codes_are_digits_only() {
        for _ in 0..32 {
            assert!(generate_code(Some(12)).chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn leading_zeros_are_kept() {
        let mut rng = StepRng::new(0, 0);
        assert_eq!(generate_code_with_rng(&mut rng, Some(5)), "00000");
    }
}
