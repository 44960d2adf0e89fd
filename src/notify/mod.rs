//! Notification delivery for newly found packages.
//!
//! Every mode prints the report to stdout. The `email` mode additionally
//! sends it through SendGrid. Exit-status signalling is decided by the
//! binary from the run outcome, not by a notifier.

mod console;
mod sendgrid;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NotifyConfig, NotifyMode};
use crate::pipeline::NoveltyResult;

pub use console::ConsoleNotifier;
pub use sendgrid::{SendGridConfig, SendGridNotifier};

/// Report header line.
pub const REPORT_HEADER: &str = "New packages found:";

/// Printed when a run finds nothing.
pub const NOTHING_NEW: &str = "No new packages found matching the keywords.";

/// A delivery channel for run reports.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name, for logs.
    fn channel(&self) -> &'static str;

    /// Deliver a report for a non-empty result.
    async fn deliver(&self, result: &NoveltyResult) -> Result<()>;
}

/// Render the plain-text report: a header, then `- name: description`
/// per package.
pub fn format_report(result: &NoveltyResult) -> String {
    let mut report = format!("{REPORT_HEADER}\n");
    for (name, description) in result.iter() {
        report.push_str(&format!("- {name}: {description}\n"));
    }
    report
}

/// Build the notifiers for a mode.
///
/// Email credentials are read through `lookup` (normally the process
/// environment) and are checked here, so a misconfigured email mode fails
/// before anything is fetched.
pub fn build_notifiers<F>(
    mode: NotifyMode,
    config: &NotifyConfig,
    lookup: F,
) -> Result<Vec<Box<dyn Notifier>>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut notifiers: Vec<Box<dyn Notifier>> = vec![Box::new(ConsoleNotifier::new())];

    if mode == NotifyMode::Email {
        let sendgrid = SendGridConfig::from_lookup(&config.email_endpoint, lookup)?;
        notifiers.push(Box::new(SendGridNotifier::new(sendgrid)?));
    }

    Ok(notifiers)
}
