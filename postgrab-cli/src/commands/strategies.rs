//! Strategies command - list retrieval strategies.

use anyhow::Result;

use super::{load_config, retriever_from_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the strategies command.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = load_config().await?;
    let retriever = retriever_from_config(&config);
    let infos = retriever.strategy_info().await;

    match cli.format {
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&infos)?);
        }
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!(
                "Strategies for @{} ({:?} mode)",
                retriever.target().identifier(),
                config.retrieval.source
            );
            println!("{}", "─".repeat(50));
            println!("{}", formatter.format_strategies_header());
            for info in &infos {
                println!("{}", formatter.format_strategy_line(info));
            }
            if infos.is_empty() {
                println!("No strategies enabled for this source mode.");
            }
        }
    }

    Ok(())
}
