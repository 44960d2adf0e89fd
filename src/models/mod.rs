//! Data models for the watcher.

pub mod config;
pub mod entry;

pub use config::{Config, FilterConfig, HistoryConfig, NotifyConfig, NotifyMode, SourceConfig};
pub use entry::{NO_DESCRIPTION, RawEntry, split_link_text};
