//! Pipeline entry points for a watch run.
//!
//! - `matcher`: partial-ratio keyword matching
//! - `novelty`: selecting matches absent from history
//! - `watch`: fetch -> extract -> filter -> persist -> notify

pub mod matcher;
pub mod novelty;
pub mod watch;

pub use matcher::{KeywordMatcher, matches, partial_ratio};
pub use novelty::{NoveltyFilter, NoveltyResult, filter_novel};
pub use watch::{ATTENTION_EXIT_CODE, Delivery, RunOutcome, Watcher, run_watch};
