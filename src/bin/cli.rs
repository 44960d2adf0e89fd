//! wnpp-watch CLI
//!
//! One invocation performs one run; schedule it externally (cron, CI).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use wnpp_watch::{
    error::Result,
    models::{Config, NotifyMode},
    notify::{self, NOTHING_NEW},
    pipeline::Watcher,
    storage::LocalHistoryStore,
};

/// wnpp-watch - Orphaned package keyword watcher
#[derive(Parser, Debug)]
#[command(
    name = "wnpp-watch",
    version,
    about = "Reports newly orphaned Debian packages matching keywords"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "wnpp-watch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the listing once and report new matches (default)
    Run {
        /// Override the configured notification mode
        #[arg(long, value_enum)]
        mode: Option<NotifyMode>,

        /// Override the configured history file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Validate configuration (and email settings in email mode)
    Validate {
        /// Override the configured notification mode
        #[arg(long, value_enum)]
        mode: Option<NotifyMode>,
    },

    /// Show the reported-package history
    History,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<ExitCode> {
    let mut config = Config::load_or_default(&cli.config)?;

    match cli.command.unwrap_or(Command::Run {
        mode: None,
        history: None,
    }) {
        Command::Run { mode, history } => {
            if let Some(mode) = mode {
                config.notify.mode = mode;
            }
            if let Some(path) = history {
                config.history.path = path;
            }

            let watcher = Watcher::from_config(config, |key| std::env::var(key).ok())?;
            let outcome = watcher.run().await?;
            if !outcome.has_novelty() {
                println!("{NOTHING_NEW}");
            }

            match outcome.exit_status(watcher.config().notify.mode) {
                Some((code, message)) => {
                    eprintln!("{message}");
                    Ok(ExitCode::from(code))
                }
                None => Ok(ExitCode::SUCCESS),
            }
        }

        Command::Validate { mode } => {
            log::info!("Validating configuration...");
            if let Some(mode) = mode {
                config.notify.mode = mode;
            }

            config.validate()?;
            notify::build_notifiers(config.notify.mode, &config.notify, |key| {
                std::env::var(key).ok()
            })?;

            log::info!(
                "Config OK: {} keywords, threshold {}, mode {}",
                config.filter.keywords.len(),
                config.filter.threshold,
                config.notify.mode
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::History => {
            let store = LocalHistoryStore::new(&config.history.path);
            match store.load_file().await? {
                Some(file) => {
                    println!(
                        "{} packages reported (updated {})",
                        file.count,
                        file.updated_at.to_rfc3339()
                    );
                    for name in &file.packages {
                        println!("- {name}");
                    }
                }
                None => println!("No history at {}", config.history.path.display()),
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
