//! Title similarity for duplicate detection.

use serde::Serialize;
use std::collections::HashSet;

const STOPWORDS: &[&str] = &[
    "a", "an", "and", "are", "at", "be", "for", "in", "is", "it", "of", "on", "or", "the", "to",
    "when", "with",
];

/// Jaccard similarity between two titles, kept as a ratio.
///
/// Titles are lower-cased, split on whitespace, stripped of surrounding
/// punctuation, and filtered of stopwords before comparison.
///
/// Stopwords are dropped so filler words do not dilute the score of short
/// titles: "Login button broken" and "Login button is broken on mobile"
/// share three of four content tokens (0.75, a duplicate) rather than three
/// of six (0.5, not a duplicate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TitleSimilarity {
    /// Tokens present in both titles.
    pub shared: usize,
    /// Tokens present in either title.
    pub total: usize,
}

impl TitleSimilarity {
    /// Compares two titles.
    #[must_use]
    pub fn between(left: &str, right: &str) -> Self {
        let left_tokens = tokens(left);
        let right_tokens = tokens(right);
        Self {
            shared: left_tokens.intersection(&right_tokens).count(),
            total: left_tokens.union(&right_tokens).count(),
        }
    }

    /// Returns whether the similarity exceeds 0.7.
    #[must_use]
    pub const fn is_duplicate(self) -> bool {
        self.total > 0 && self.shared.saturating_mul(10) > self.total.saturating_mul(7)
    }

    /// Returns the similarity as a whole percentage.
    #[must_use]
    pub fn percent(self) -> usize {
        self.shared
            .saturating_mul(100)
            .checked_div(self.total)
            .unwrap_or(0)
    }
}

fn tokens(title: &str) -> HashSet<String> {
    title
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty() && !STOPWORDS.contains(&word.as_str()))
        .collect()
}

/// Returns the leading part of a title used as the search query.
#[must_use]
pub fn search_prefix(title: &str) -> String {
    title.trim().chars().take(50).collect()
}
