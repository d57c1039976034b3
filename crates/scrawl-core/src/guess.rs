//! Guess evaluation.
//!
//! A pure comparison of a submitted guess against the room's secret word.
//! No partial credit, no fuzzy matching. Fails closed: a room without a
//! current word never reports a correct guess.

/// Returns whether `guess` matches the secret word.
///
/// Both sides are normalized (trimmed, lowercased) before comparison, so
/// `"DOG"` matches `"dog"` but `"dogs"` does not.
pub fn is_correct(secret: Option<&str>, guess: &str) -> bool {
    match secret {
        Some(word) => normalize(word) == normalize(guess),
        None => false,
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(is_correct(Some("dog"), "dog"));
    }

    #[test]
    fn case_insensitive() {
        assert!(is_correct(Some("dog"), "DOG"));
        assert!(is_correct(Some("Dog"), "dOg"));
    }

    #[test]
    fn surrounding_whitespace_ignored() {
        assert!(is_correct(Some("dog"), "  dog "));
    }

    #[test]
    fn near_miss_is_wrong() {
        assert!(!is_correct(Some("dog"), "dogs"));
        assert!(!is_correct(Some("dog"), "do"));
        assert!(!is_correct(Some("dog"), ""));
    }

    #[test]
    fn no_secret_fails_closed() {
        assert!(!is_correct(None, "dog"));
        assert!(!is_correct(None, ""));
    }
}
