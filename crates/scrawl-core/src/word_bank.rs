//! Word selection.
//!
//! [`WordBank`] is the strategy seam for word choice: the required behavior
//! is a uniform random pick over a fixed catalog, and alternative policies
//! (no-repeat windows, adaptive difficulty) slot in behind the same trait
//! without touching the coordinator.

use rand::seq::SliceRandom;

/// A chosen word plus its ordered drawing-step hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordChoice {
    /// The secret word for the turn.
    pub word: String,
    /// Human-readable drawing hints, delivered to the drawer with the word.
    pub steps: Vec<String>,
}

/// Supplies a word and drawing hints for each new turn.
pub trait WordBank: Send + Sync + 'static {
    /// Choose a word for a new turn.
    fn choose_word(&self) -> WordChoice;
}

/// The default word bank: uniform random over a fixed catalog.
///
/// Carries no memory of recently used words; repeats across turns are
/// acceptable.
#[derive(Debug, Clone)]
pub struct CatalogWordBank {
    catalog: Vec<String>,
}

impl CatalogWordBank {
    /// The built-in catalog.
    pub const DEFAULT_CATALOG: [&'static str; 5] =
        ["apple", "banana", "cat", "dog", "elephant"];

    /// Create a word bank over the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(Self::DEFAULT_CATALOG.iter().map(|w| (*w).to_string()))
    }

    /// Create a word bank over a custom catalog.
    ///
    /// A single-word catalog makes selection deterministic, which tests rely
    /// on.
    pub fn with_catalog(words: impl IntoIterator<Item = String>) -> Self {
        let catalog: Vec<String> = words.into_iter().collect();
        debug_assert!(!catalog.is_empty(), "word catalog must not be empty");
        Self { catalog }
    }

    /// Number of words in the catalog.
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }
}

impl Default for CatalogWordBank {
    fn default() -> Self {
        Self::new()
    }
}

impl WordBank for CatalogWordBank {
    fn choose_word(&self) -> WordChoice {
        let word = self
            .catalog
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_else(|| "apple".to_string());
        let steps = steps_for(&word);
        WordChoice { word, steps }
    }
}

/// Drawing hints for a word.
fn steps_for(word: &str) -> Vec<String> {
    vec![
        format!("Step 1: Draw the {word}"),
        format!("Step 2: Add details to the {word}"),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn choice_comes_from_catalog() {
        let bank = CatalogWordBank::new();
        for _ in 0..50 {
            let choice = bank.choose_word();
            assert!(CatalogWordBank::DEFAULT_CATALOG.contains(&choice.word.as_str()));
        }
    }

    #[test]
    fn steps_reference_the_word() {
        let bank = CatalogWordBank::with_catalog(["dog".to_string()]);
        let choice = bank.choose_word();
        assert_eq!(choice.word, "dog");
        assert_eq!(choice.steps.len(), 2);
        assert!(choice.steps.iter().all(|s| s.contains("dog")));
    }

    #[test]
    fn single_word_catalog_is_deterministic() {
        let bank = CatalogWordBank::with_catalog(["cat".to_string()]);
        let words: HashSet<String> = (0..10).map(|_| bank.choose_word().word).collect();
        assert_eq!(words.len(), 1);
    }
}
