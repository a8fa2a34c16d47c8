//! Strength checks for configured secrets.
//!
//! Used by the web crates when loading session secrets and API tokens, so a
//! copied `.env.example` value never reaches production.

use std::collections::HashMap;

/// Minimum length of a session signing secret.
pub const MIN_SESSION_SECRET_LENGTH: usize = 32;

/// Minimum Shannon entropy, in bits per character.
pub const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Case-insensitive fragments that mark a value as a placeholder.
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Why a secret was rejected.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum WeakSecret {
    #[error("must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },
    #[error("appears to be a placeholder (contains '{0}')")]
    Placeholder(&'static str),
    #[error(
        "entropy too low ({0:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
    )]
    LowEntropy(f64),
}

/// Shannon entropy of a string in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    let mut freq: HashMap<char, usize> = HashMap::new();
    let mut total = 0_usize;
    for c in s.chars() {
        *freq.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)] // Secrets are far shorter than 2^52 chars
    let total = total as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy values.
///
/// # Errors
///
/// Returns [`WeakSecret::Placeholder`] or [`WeakSecret::LowEntropy`].
pub fn check_strength(secret: &str) -> Result<(), WeakSecret> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(WeakSecret::Placeholder(pattern));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(WeakSecret::LowEntropy(entropy));
    }
    Ok(())
}

/// Check a session signing secret: length first, then strength.
///
/// # Errors
///
/// Returns the first failed check.
pub fn check_session_secret(secret: &str) -> Result<(), WeakSecret> {
    let actual = secret.chars().count();
    if actual < MIN_SESSION_SECRET_LENGTH {
        return Err(WeakSecret::TooShort {
            min: MIN_SESSION_SECRET_LENGTH,
            actual,
        });
    }
    check_strength(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_edges() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("zzzzzz").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_placeholders_rejected() {
        assert_eq!(
            check_strength("your-session-key-goes-here"),
            Err(WeakSecret::Placeholder("your-"))
        );
        assert!(matches!(
            check_strength("CHANGEME-9f8e7d6c"),
            Err(WeakSecret::Placeholder("changeme"))
        ));
    }

    #[test]
    fn test_low_entropy_rejected() {
        assert!(matches!(
            check_strength(&"ab".repeat(20)),
            Err(WeakSecret::LowEntropy(_))
        ));
    }

    #[test]
    fn test_session_secret_length_checked_first() {
        assert_eq!(
            check_session_secret("aB3$xY9!"),
            Err(WeakSecret::TooShort { min: 32, actual: 8 })
        );
        assert!(check_session_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%").is_ok());
    }
}
