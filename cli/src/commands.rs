use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use console::style;

use repatch_agent::RepoAgent;
use repatch_config::Config;
use repatch_context::tree::{build_tree, render_tree};
use repatch_core::ChangeAction;
use repatch_llm::{AnthropicProvider, CostTracker, ModelProvider};
use repatch_remote::{GithubClient, RepoAccessor};

#[derive(Parser)]
#[command(
    name = "repatch",
    about = "Converse with a model that reads and edits a remote repository"
)]
pub struct Cli {
    /// Path to a config file (default: .repatch.{toml,yml,yaml,json})
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one conversational turn against the repository
    Ask {
        /// The request, e.g. "fix the Checkout bug"
        request: String,

        /// Override the import-expansion depth bound
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Print the repository file tree
    Tree,
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    Ok(match path {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    })
}

fn github_client(config: &Config) -> Result<GithubClient> {
    let token =
        std::env::var("GITHUB_TOKEN").map_err(|_| anyhow!("GITHUB_TOKEN not set"))?;
    Ok(GithubClient::new(
        config.repo.owner.as_str(),
        config.repo.name.as_str(),
        token,
        config.context.remote_timeout_secs,
    )?)
}

pub async fn handle_ask(
    request: String,
    depth: Option<usize>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(depth) = depth {
        config.context.max_depth = depth;
    }

    let api_key = std::env::var("ANTHROPIC_API_KEY")
        .map_err(|_| anyhow!("ANTHROPIC_API_KEY not set"))?;

    let repo: Arc<dyn RepoAccessor> = Arc::new(github_client(&config)?);
    let provider: Arc<dyn ModelProvider> = match &config.llm.api_base {
        Some(base) => Arc::new(AnthropicProvider::with_base(
            config.llm.model.as_str(),
            api_key,
            base.as_str(),
            config.llm.max_tokens,
            config.llm.timeout_secs,
        )?),
        None => Arc::new(AnthropicProvider::new(
            config.llm.model.as_str(),
            api_key,
            config.llm.max_tokens,
            config.llm.timeout_secs,
        )?),
    };
    let tracker = Arc::new(CostTracker::new(&config.llm.model));
    let agent = RepoAgent::new(provider, repo, &config, tracker.clone());

    let outcome = agent.run_turn(&request, &[], None).await?;

    let skin = termimad::MadSkin::default();
    skin.print_text(&outcome.text);

    if !outcome.changes.is_empty() {
        println!();
        println!("{}", style("Changed files").bold());
        for change in &outcome.changes {
            let tag = match change.action {
                ChangeAction::Create => "created",
                ChangeAction::Edit => "edited",
                ChangeAction::Delete => "deleted",
            };
            println!("  {} {}", style(tag).green(), change.path);
        }
    }

    let ledger = tracker.snapshot();
    println!();
    println!(
        "{} {} in / {} out tokens, ${:.4}",
        style("usage:").dim(),
        ledger.tokens.input,
        ledger.tokens.output,
        ledger.session_cost
    );

    Ok(())
}

pub async fn handle_tree(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let repo = github_client(&config)?;
    let entries = repo.get_tree(&config.repo.branch).await?;
    print!("{}", render_tree(&build_tree(entries)));
    Ok(())
}
