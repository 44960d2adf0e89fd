//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
///
/// Built once at startup and handed to every component by reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the orphaned-package listing comes from
    #[serde(default)]
    pub source: SourceConfig,

    /// Keyword matching settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Persisted history of reported packages
    #[serde(default)]
    pub history: HistoryConfig,

    /// Notification delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.filter.normalize();
        Ok(config)
    }

    /// Load configuration, or the defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "Config file {:?} not found. Using defaults.",
                    path.as_ref()
                );
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.source.url)?;
        if self.source.link_prefix.trim().is_empty() {
            return Err(AppError::validation("source.link_prefix is empty"));
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.filter.keywords.is_empty() {
            return Err(AppError::validation("No keywords defined"));
        }
        if self.filter.keywords.iter().any(|k| k.trim().is_empty()) {
            return Err(AppError::validation("filter.keywords contains an empty keyword"));
        }
        if self.filter.threshold > 100 {
            return Err(AppError::validation(format!(
                "filter.threshold must be within 0..=100, got {}",
                self.filter.threshold
            )));
        }
        if self.history.path.as_os_str().is_empty() {
            return Err(AppError::validation("history.path is empty"));
        }
        if self.notify.mode == NotifyMode::Email {
            url::Url::parse(&self.notify.email_endpoint)?;
        }
        Ok(())
    }
}

/// Listing page location and HTTP client behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the orphaned-package listing
    #[serde(default = "defaults::url")]
    pub url: String,

    /// Only anchors whose href starts with this prefix are entries
    #[serde(default = "defaults::link_prefix")]
    pub link_prefix: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::url(),
            link_prefix: defaults::link_prefix(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Keyword list and fuzzy-match threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Keywords tested in order against each package name
    #[serde(default = "defaults::keywords")]
    pub keywords: Vec<String>,

    /// Minimum partial-ratio score (0-100) for a match
    #[serde(default = "defaults::threshold")]
    pub threshold: u8,
}

impl FilterConfig {
    /// Lowercase and trim every keyword, keeping the configured order.
    pub fn normalize(&mut self) {
        for keyword in &mut self.keywords {
            *keyword = keyword.trim().to_lowercase();
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keywords: defaults::keywords(),
            threshold: defaults::threshold(),
        }
    }
}

/// History file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "defaults::history_path")]
    pub path: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: defaults::history_path(),
        }
    }
}

/// How a run surfaces its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum NotifyMode {
    /// Print the report and exit 0
    #[default]
    Console,
    /// Print the report and exit non-zero when something new was found
    Exit,
    /// Print the report and send it by email
    Email,
}

impl std::fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NotifyMode::Console => "console",
            NotifyMode::Exit => "exit",
            NotifyMode::Email => "email",
        };
        f.write_str(name)
    }
}

/// Notification settings. Email credentials come from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub mode: NotifyMode,

    /// SendGrid-compatible mail send endpoint
    #[serde(default = "defaults::email_endpoint")]
    pub email_endpoint: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            mode: NotifyMode::default(),
            email_endpoint: defaults::email_endpoint(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn url() -> String {
        "https://www.debian.org/devel/wnpp/orphaned".into()
    }
    pub fn link_prefix() -> String {
        "https://bugs.debian.org/".into()
    }
    pub fn user_agent() -> String {
        concat!("wnpp-watch/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Filter defaults
    pub fn keywords() -> Vec<String> {
        [
            "science",
            "scientific",
            "physics",
            "performance",
            "hcp",
            "cfd",
            "fluid",
            "mri",
            "computational",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
    pub fn threshold() -> u8 {
        80
    }

    // History defaults
    pub fn history_path() -> PathBuf {
        PathBuf::from("package_history.json")
    }

    // Notify defaults
    pub fn email_endpoint() -> String {
        "https://api.sendgrid.com/v3/mail/send".into()
    }
}
