//! Package entry scraped from the listing page.

use serde::{Deserialize, Serialize};

/// Description used when an anchor's text has no `name: description` split.
pub const NO_DESCRIPTION: &str = "No description available";

/// One orphaned-package anchor, as found on the page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    /// Package name (text before the first colon)
    pub name: String,

    /// Short description, or [`NO_DESCRIPTION`]
    pub description: String,
}

impl RawEntry {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Build an entry from an anchor's visible text.
    ///
    /// Text without a colon keeps the whole text as the name and gets the
    /// placeholder description.
    pub fn from_link_text(text: &str) -> Self {
        let text = text.trim();
        match split_link_text(text) {
            Some((name, description)) => Self::new(name, description),
            None => Self::new(text, NO_DESCRIPTION),
        }
    }
}

/// Split `name: description` on the first colon, trimming both halves.
///
/// Returns `None` when the text has no colon.
pub fn split_link_text(text: &str) -> Option<(&str, &str)> {
    text.split_once(':')
        .map(|(name, description)| (name.trim(), description.trim()))
}
