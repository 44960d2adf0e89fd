//! Standard output notifier.

use async_trait::async_trait;

use crate::error::Result;
use crate::notify::{Notifier, format_report};
use crate::pipeline::NoveltyResult;

/// Prints the report to stdout.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn channel(&self) -> &'static str {
        "console"
    }

    async fn deliver(&self, result: &NoveltyResult) -> Result<()> {
        println!("{}", format_report(result));
        Ok(())
    }
}
