//! apkdesk CLI
//!
//! Terminal front end for the package analyzer: runs analyses through the
//! external engine and manages the persisted history and current result.

mod commands;
mod output;

use anyhow::{Context, Result};
use apkdesk_core::{Session, StoreConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apkdesk")]
#[command(version)]
#[command(about = "Analyze application packages and keep a history of results", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a package file
    Analyze {
        /// Path to the package
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Browse and manage analysis history
    History {
        #[command(subcommand)]
        action: Option<HistoryAction>,
    },

    /// Show or clear the current analysis
    Current {
        #[command(subcommand)]
        action: Option<CurrentAction>,
    },

    /// Write an HTML report for the current analysis or a history entry
    Report {
        /// History entry to report on instead of the current analysis
        #[arg(long)]
        id: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version and storage configuration
    Version,
}

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List history entries, newest first
    List,
    /// Display a history entry and make it the current analysis
    Show {
        /// Entry identifier
        id: String,
    },
    /// Remove a history entry
    Remove {
        /// Entry identifier
        id: String,
    },
    /// Remove every history entry
    Clear,
}

#[derive(Subcommand)]
pub enum CurrentAction {
    /// Show the current analysis
    Show,
    /// Clear the current analysis
    Clear,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Default to warn to keep output clean
    let filter = if cli.verbose {
        "apkdesk=debug,apkdesk_core=debug"
    } else if cli.quiet {
        "apkdesk=error,apkdesk_core=error"
    } else {
        "apkdesk=warn,apkdesk_core=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .without_time()
        .init();

    let config = StoreConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if matches!(cli.command, Commands::Version) {
        commands::version::run(&config);
        return Ok(());
    }

    let mut session = Session::from_config(&config).context("Failed to open session")?;

    match cli.command {
        Commands::Analyze {
            path,
            format,
            output,
        } => commands::analyze::run(&mut session, path, format, output).await,
        Commands::History { action } => {
            commands::history::run(&mut session, action.unwrap_or(HistoryAction::List))
        }
        Commands::Current { action } => {
            commands::current::run(&mut session, action.unwrap_or(CurrentAction::Show))
        }
        Commands::Report { id, output } => commands::report::run(&mut session, id, output),
        Commands::Version => Ok(()),
    }
}
