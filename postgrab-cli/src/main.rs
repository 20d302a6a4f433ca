// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! postgrab CLI - fetch the latest post from a public profile.
//!
//! # Examples
//!
//! ```bash
//! # Latest post for the configured profile
//! postgrab
//!
//! # A specific profile
//! postgrab latest --target nasa
//!
//! # Only the static strategy, JSON output
//! postgrab latest --source static --format json --pretty
//!
//! # Which strategies would run
//! postgrab strategies
//!
//! # Change the default profile
//! postgrab config set-target esa
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, latest, strategies};

// ============================================================================
// CLI Definition
// ============================================================================

/// postgrab CLI - latest post retrieval.
#[derive(Parser)]
#[command(name = "postgrab")]
#[command(about = "Fetch the most recent post from a public Instagram profile")]
#[command(long_about = r#"
postgrab fetches the most recent post (caption, image, timestamp) from a
public Instagram profile.

Strategies, tried in order until one succeeds:
  • Headless browser (instagram.browser)
  • Static document  (instagram.static)
  • Graph API        (instagram.api, needs INSTAGRAM_ACCESS_TOKEN)

Examples:
  postgrab                           # Configured profile
  postgrab latest --target nasa      # Another profile
  postgrab latest --source static    # One strategy only
  postgrab --format json             # JSON output
  postgrab strategies                # Strategy availability
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'latest' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info and the attempt ledger).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the latest post (default if no command specified).
    #[command(visible_alias = "l")]
    Latest(latest::LatestArgs),

    /// List retrieval strategies and whether they can run.
    #[command(visible_alias = "s")]
    Strategies,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Every strategy failed; no post retrieved.
    NotFound = 2,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("postgrab=debug,info")
    } else {
        EnvFilter::new("postgrab=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Latest(args)) => latest::run(args, &cli).await,
        Some(Commands::Strategies) => strategies::run(&cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => latest::run(&latest::LatestArgs::default(), &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
