// src/services/orphaned.rs

//! Orphaned-package listing retrieval and parsing.
//!
//! The listing is a plain HTML page where each orphaned package is an
//! anchor pointing at its bug report, with text `name: description`.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{RawEntry, SourceConfig};
use crate::utils::http::{create_async_client, fetch_text};

const LINK_SELECTOR: &str = "a[href]";

/// Anything that can produce the listing page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page body.
    async fn fetch(&self) -> Result<String>;

    /// Where the page comes from, for logs.
    fn url(&self) -> &str;
}

/// Listing page fetched over HTTP.
pub struct HttpPageSource {
    client: Client,
    url: String,
}

impl HttpPageSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            url: config.url.clone(),
        })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self) -> Result<String> {
        log::info!("Fetching {}", self.url);
        fetch_text(&self.client, &self.url).await
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Extracts package entries from listing markup.
///
/// The raw `href` attribute is compared with the prefix as written; it is
/// not resolved or normalized first.
#[derive(Debug, Clone)]
pub struct OrphanedListParser {
    link_prefix: String,
}

impl OrphanedListParser {
    /// Parser keeping anchors whose href starts with `link_prefix`.
    pub fn new(link_prefix: impl Into<String>) -> Self {
        Self {
            link_prefix: link_prefix.into(),
        }
    }

    /// Entries in document order.
    pub fn extract(&self, html: &str) -> Result<Vec<RawEntry>> {
        let document = Html::parse_document(html);
        let link_sel = Self::parse_selector(LINK_SELECTOR)?;

        let entries: Vec<RawEntry> = document
            .select(&link_sel)
            .filter(|link| {
                link.value()
                    .attr("href")
                    .is_some_and(|href| href.starts_with(&self.link_prefix))
            })
            .map(|link| {
                let text: String = link.text().collect();
                RawEntry::from_link_text(&text)
            })
            .collect();

        log::debug!("Extracted {} entries", entries.len());
        Ok(entries)
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

/// Convenience function to extract entries.
pub fn extract_entries(html: &str, link_prefix: &str) -> Result<Vec<RawEntry>> {
    OrphanedListParser::new(link_prefix).extract(html)
}
