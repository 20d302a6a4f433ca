//! Latest command - fetch the most recent post.

use anyhow::Result;
use clap::{Args, ValueEnum};
use postgrab_fetch::SourceMode;
use postgrab_store::Config;
use tracing::{debug, info};

use super::{load_config, retriever_from_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Arguments for the latest command.
#[derive(Args, Default)]
pub struct LatestArgs {
    /// Profile handle or URL (overrides the configured target).
    #[arg(long, short)]
    pub target: Option<String>,

    /// Restrict retrieval to one strategy.
    #[arg(long, short)]
    pub source: Option<SourceArg>,

    /// Overall timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Write diagnostic artifacts when extraction fails.
    #[arg(long)]
    pub dump_artifacts: bool,
}

/// Source selection for the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Browser, then static, then API.
    Auto,
    /// Headless browser only.
    Browser,
    /// Static document only.
    Static,
    /// Graph API only.
    Api,
}

impl From<SourceArg> for SourceMode {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Auto => SourceMode::Auto,
            SourceArg::Browser => SourceMode::Browser,
            SourceArg::Static => SourceMode::Static,
            SourceArg::Api => SourceMode::Api,
        }
    }
}

/// Applies command-line overrides on top of the stored configuration.
fn apply_overrides(config: &mut Config, args: &LatestArgs) -> Result<()> {
    if let Some(raw) = &args.target {
        config.set_target(raw)?;
    }
    if let Some(source) = args.source {
        config.retrieval.source = source.into();
    }
    if let Some(secs) = args.timeout {
        config.general.timeout_secs = secs;
    }
    if args.dump_artifacts {
        config.retrieval.dump_artifacts = true;
    }
    Ok(())
}

/// Runs the latest command.
pub async fn run(args: &LatestArgs, cli: &Cli) -> Result<()> {
    let mut config = load_config().await?;
    apply_overrides(&mut config, args)?;
    debug!(?config, "Effective configuration");

    let retriever = retriever_from_config(&config);
    let target = retriever.target();
    info!(profile = %target.identifier(), "Fetching latest post");

    let outcome = retriever.get_latest_post_detailed().await;

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_outcome(&outcome, target.identifier())?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            match &outcome.result {
                Ok(result) => {
                    println!(
                        "{}",
                        formatter.format_post(&result.post, target.identifier())
                    );
                }
                Err(e) => {
                    if !cli.quiet {
                        eprintln!("{}", formatter.format_failure(target.identifier(), &e.to_string()));
                    }
                }
            }
            if cli.verbose && !cli.quiet {
                println!();
                println!("{}", formatter.format_attempts(&outcome.attempts));
            }
        }
    }

    if !outcome.is_success() {
        std::process::exit(ExitCode::NotFound as i32);
    }

    Ok(())
}
