// src/pipeline/watch.rs

//! One watch run over the orphaned-package listing.

use crate::error::Result;
use crate::models::{Config, NotifyMode};
use crate::notify::{Notifier, build_notifiers};
use crate::services::{HttpPageSource, OrphanedListParser, PageSource};
use crate::storage::{HistoryStore, LocalHistoryStore};

use super::matcher::KeywordMatcher;
use super::novelty::{NoveltyResult, filter_novel};

/// Process exit status for a run that found new packages in `exit` mode.
pub const ATTENTION_EXIT_CODE: u8 = 2;

/// Result of a delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub channel: &'static str,
    /// Error message when the channel failed
    pub error: Option<String>,
}

impl Delivery {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a watch run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Entries extracted from the page
    pub entries_seen: usize,
    /// Packages reported for the first time
    pub novel: NoveltyResult,
    /// Whether the history was written
    pub history_saved: bool,
    /// History size after the run
    pub history_size: usize,
    /// One record per notifier, in dispatch order
    pub deliveries: Vec<Delivery>,
}

impl RunOutcome {
    /// Check if anything new was found.
    pub fn has_novelty(&self) -> bool {
        !self.novel.is_empty()
    }

    /// Non-zero exit status and message the process should end with, if any.
    ///
    /// Only `exit` mode turns new packages into a failure status; `console`
    /// and `email` always finish successfully.
    pub fn exit_status(&self, mode: NotifyMode) -> Option<(u8, String)> {
        if mode != NotifyMode::Exit || !self.has_novelty() {
            return None;
        }
        Some((
            ATTENTION_EXIT_CODE,
            format!(
                "Found {} new package(s) matching the keywords",
                self.novel.len()
            ),
        ))
    }
}

/// Run the watcher once.
///
/// The history is loaded before the page is fetched and is only written
/// when something new was found. It is saved before any notifier runs, so
/// a failed delivery is not repeated by the next run. Delivery failures
/// are logged and recorded in the outcome, never returned as errors.
pub async fn run_watch(
    config: &Config,
    source: &dyn PageSource,
    store: &dyn HistoryStore,
    notifiers: &[Box<dyn Notifier>],
) -> Result<RunOutcome> {
    let mut history = store.load().await?;

    let html = source.fetch().await?;
    let entries = OrphanedListParser::new(&config.source.link_prefix).extract(&html)?;
    log::info!("Found {} orphaned packages on {}", entries.len(), source.url());

    let matcher = KeywordMatcher::from_config(&config.filter);
    let novel = filter_novel(&entries, &matcher, &history);

    let mut outcome = RunOutcome {
        entries_seen: entries.len(),
        history_size: history.len(),
        ..RunOutcome::default()
    };

    if novel.is_empty() {
        log::info!("Nothing new; history at {} left untouched", store.location());
        return Ok(outcome);
    }

    log::info!("{} new matching package(s)", novel.len());
    history.extend(novel.names().map(String::from));
    store.save(&history).await?;
    outcome.history_saved = true;
    outcome.history_size = history.len();

    for notifier in notifiers {
        let error = match notifier.deliver(&novel).await {
            Ok(()) => None,
            Err(e) => {
                log::warn!("Delivery via {} failed: {}", notifier.channel(), e);
                Some(e.to_string())
            }
        };
        outcome.deliveries.push(Delivery {
            channel: notifier.channel(),
            error,
        });
    }

    outcome.novel = novel;
    Ok(outcome)
}

/// A fully wired watcher: HTTP listing, file history, configured notifiers.
pub struct Watcher {
    config: Config,
    source: HttpPageSource,
    store: LocalHistoryStore,
    notifiers: Vec<Box<dyn Notifier>>,
}

impl Watcher {
    /// Validate `config` and build every component.
    ///
    /// Notifiers are built first, so missing email settings fail here
    /// before any request is made. `lookup` resolves environment variables.
    pub fn from_config<F>(config: Config, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        config.validate()?;
        let notifiers = build_notifiers(config.notify.mode, &config.notify, lookup)?;
        let source = HttpPageSource::new(&config.source)?;
        let store = LocalHistoryStore::new(&config.history.path);

        Ok(Self {
            config,
            source,
            store,
            notifiers,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run once.
    pub async fn run(&self) -> Result<RunOutcome> {
        run_watch(&self.config, &self.source, &self.store, &self.notifiers).await
    }
}
