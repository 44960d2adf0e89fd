//! Storage abstractions for the reported-package history.
//!
//! The history is a set of package names that only grows: a run adds the
//! names it reported and never removes any.

pub mod local;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

// Re-export for convenience
pub use local::LocalHistoryStore;

/// Names of packages already reported, kept sorted for stable output.
pub type HistorySet = BTreeSet<String>;

/// On-disk form of the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    /// ISO 8601 timestamp of last update
    pub updated_at: DateTime<Utc>,
    /// Number of names stored
    pub count: usize,
    /// The reported package names
    pub packages: HistorySet,
}

impl HistoryFile {
    pub fn new(packages: HistorySet) -> Self {
        Self {
            updated_at: Utc::now(),
            count: packages.len(),
            packages,
        }
    }
}

/// Trait for history backends.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load the history. A store with no saved state yields an empty set.
    async fn load(&self) -> Result<HistorySet>;

    /// Replace the saved history with `history`.
    async fn save(&self, history: &HistorySet) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}
