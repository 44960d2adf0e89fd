//! Service layer for the watcher.
//!
//! - Listing page retrieval (`PageSource`, `HttpPageSource`)
//! - Orphaned-package entry extraction (`OrphanedListParser`)

mod orphaned;

pub use orphaned::{HttpPageSource, OrphanedListParser, PageSource, extract_entries};
