//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use postgrab_fetch::DirectorySink;
use postgrab_store::{Config, default_config_dir, default_config_path};
use tracing::info;

use super::load_config;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the default profile.
    SetTarget {
        /// Profile handle or URL.
        identifier: String,
    },

    /// Write a default configuration file.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli),
        ConfigAction::SetTarget { identifier } => set_target(identifier).await,
        ConfigAction::Init { force } => init_config(*force).await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let config = load_config().await?;

    match cli.format {
        OutputFormat::Text => {
            let credential_set = config.to_target().has_credential();
            let r = &config.retrieval;

            println!("postgrab Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Target:          @{}", config.target.identifier);
            println!(
                "Credential env:  {} ({})",
                config.target.credential_env,
                if credential_set { "set" } else { "not set" }
            );
            println!("Source mode:     {:?}", r.source);
            println!("Timeout:         {}s", config.general.timeout_secs);
            println!("Retry attempts:  {}", r.retry_attempts);
            println!("Base delay:      {}ms (+{}ms jitter)", r.base_delay_ms, r.jitter_ms);
            println!("Settle delay:    {}ms", r.settle_delay_ms);
            if r.allowed_domains.is_empty() {
                println!("Allowed domains: any");
            } else {
                println!("Allowed domains: {}", r.allowed_domains.join(", "));
            }
            println!("Dump artifacts:  {}", r.dump_artifacts);
            if let Some(dir) = &r.artifact_dir {
                println!("Artifact dir:    {}", dir.display());
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&config)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli) -> Result<()> {
    let config_dir = default_config_dir();
    let config_path = default_config_path();
    let artifact_dir = DirectorySink::default_dir();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Config file:   {}", config_path.display());
            if let Some(dir) = &artifact_dir {
                println!("Artifacts:     {}", dir.display());
            }
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "config_file": config_path.display().to_string(),
                "artifact_dir": artifact_dir.map(|d| d.display().to_string()),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn set_target(identifier: &str) -> Result<()> {
    let mut config = load_config().await?;
    config.set_target(identifier)?;
    config.save().await?;

    info!(profile = %config.target.identifier, "Default target updated");
    println!("Default target set to: @{}", config.target.identifier);

    Ok(())
}

async fn init_config(force: bool) -> Result<()> {
    let path = default_config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    Config::default().save_to(&path).await?;
    info!(path = %path.display(), "Configuration initialized");
    println!("Wrote default configuration to {}", path.display());

    Ok(())
}
