//! Novelty detection for keyword-matching packages.
//!
//! Computes the packages on the current page that match a keyword and
//! have never been reported before, for notification dispatch.

use indexmap::IndexMap;

use crate::models::RawEntry;
use crate::pipeline::matcher::KeywordMatcher;
use crate::storage::HistorySet;

/// Newly discovered packages, keyed by name in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoveltyResult {
    packages: IndexMap<String, String>,
}

impl NoveltyResult {
    /// Record a package. A repeated name keeps its position and takes the
    /// newer description.
    pub fn insert(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.packages.insert(name.into(), description.into());
    }

    /// Check if anything new was found.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.packages.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Package names in discovery order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// `(name, description)` pairs in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.packages
            .iter()
            .map(|(name, description)| (name.as_str(), description.as_str()))
    }
}

impl<N: Into<String>, D: Into<String>> FromIterator<(N, D)> for NoveltyResult {
    fn from_iter<T: IntoIterator<Item = (N, D)>>(iter: T) -> Self {
        let mut result = Self::default();
        for (name, description) in iter {
            result.insert(name, description);
        }
        result
    }
}

/// Filter selecting keyword matches that are absent from history.
#[derive(Debug, Clone)]
pub struct NoveltyFilter<'m> {
    matcher: &'m KeywordMatcher,
}

impl<'m> NoveltyFilter<'m> {
    pub fn new(matcher: &'m KeywordMatcher) -> Self {
        Self { matcher }
    }

    /// Select novel entries, in page order.
    ///
    /// Only the first matching keyword is considered for each entry. The
    /// history is read-only here; names found in this pass are not added
    /// to it until the caller persists the result.
    pub fn filter(&self, entries: &[RawEntry], history: &HistorySet) -> NoveltyResult {
        let mut result = NoveltyResult::default();

        for entry in entries {
            if history.contains(&entry.name) {
                continue;
            }
            if let Some((keyword, score)) = self.matcher.first_match(&entry.name) {
                log::debug!(
                    "Matched {} with {} (score: {})",
                    entry.name,
                    keyword,
                    score
                );
                result.insert(entry.name.as_str(), entry.description.as_str());
            }
        }

        result
    }
}

/// Convenience function to filter entries.
pub fn filter_novel(
    entries: &[RawEntry],
    matcher: &KeywordMatcher,
    history: &HistorySet,
) -> NoveltyResult {
    NoveltyFilter::new(matcher).filter(entries, history)
}
