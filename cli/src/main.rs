mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{handle_ask, handle_tree, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ask { request, depth } => {
            handle_ask(request, depth, cli.config).await?;
        }
        Commands::Tree => {
            handle_tree(cli.config).await?;
        }
    }

    Ok(())
}
