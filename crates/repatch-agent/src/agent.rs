//! The turn surface: seed selection, context assembly, and the tool loop
//! wired together behind one call.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use repatch_config::Config;
use repatch_context::{ContextLoader, RelevanceSelector};
use repatch_core::{LoadedContext, RepoPath, Result};
use repatch_llm::{CostTracker, Message, ModelProvider};
use repatch_remote::RepoAccessor;

use crate::driver::{ToolLoopDriver, TurnOutcome};
use crate::prompts::SYSTEM_PROMPT;

pub struct RepoAgent {
    selector: RelevanceSelector,
    loader: ContextLoader,
    driver: ToolLoopDriver,
    tracker: Arc<CostTracker>,
    max_depth: usize,
}

impl RepoAgent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        repo: Arc<dyn RepoAccessor>,
        config: &Config,
        tracker: Arc<CostTracker>,
    ) -> Self {
        let branch = config.repo.branch.clone();
        Self {
            selector: RelevanceSelector::new(repo.clone(), &config.context),
            loader: ContextLoader::new(repo.clone(), branch.clone(), config.context.clone()),
            driver: ToolLoopDriver::new(provider, repo, branch),
            tracker,
            max_depth: config.context.max_depth,
        }
    }

    /// Run one complete turn: derive seeds (unless overridden), load the
    /// bounded context, and drive the tool loop. Usage is recorded into the
    /// shared cost ledger before returning.
    pub async fn run_turn(
        &self,
        request: &str,
        history: &[Message],
        seed_override: Option<Vec<RepoPath>>,
    ) -> Result<TurnOutcome> {
        self.run_turn_cancellable(request, history, seed_override, &CancellationToken::new())
            .await
    }

    pub async fn run_turn_cancellable(
        &self,
        request: &str,
        history: &[Message],
        seed_override: Option<Vec<RepoPath>>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let seeds = match seed_override {
            Some(seeds) => seeds,
            None => self.selector.select_seeds(request).await,
        };
        info!(seeds = seeds.len(), "assembling context");
        let context = self.loader.load(&seeds, self.max_depth).await;
        info!(files = context.files.len(), "context loaded");

        let mut messages: Vec<Message> = history.to_vec();
        messages.push(Message::user(render_request(request, &context)));

        let outcome = self.driver.run(SYSTEM_PROMPT, messages, cancel).await?;
        self.tracker.record(&outcome.usage);
        Ok(outcome)
    }
}

fn render_request(request: &str, context: &LoadedContext) -> String {
    let mut out = String::new();
    if !context.tree_rendering.is_empty() {
        out.push_str("Repository tree:\n");
        out.push_str(&context.tree_rendering);
        out.push('\n');
    }
    if !context.files.is_empty() {
        out.push_str("Relevant files:\n\n");
        for file in &context.files {
            out.push_str("--- ");
            out.push_str(file.path.as_str());
            out.push_str(" ---\n");
            out.push_str(&file.content);
            out.push_str("\n\n");
        }
    }
    out.push_str("Request: ");
    out.push_str(request);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use repatch_core::FileRecord;

    #[test]
    fn test_render_request_includes_tree_files_and_request() {
        let context = LoadedContext {
            tree_rendering: "src/\n  app.ts\n".to_string(),
            files: vec![FileRecord {
                path: RepoPath::new("src/app.ts"),
                content: "export {};".to_string(),
                revision: "r1".to_string(),
            }],
        };
        let rendered = render_request("fix it", &context);
        assert!(rendered.contains("Repository tree:"));
        assert!(rendered.contains("--- src/app.ts ---"));
        assert!(rendered.ends_with("Request: fix it"));
    }

    #[test]
    fn test_render_request_with_empty_context() {
        let rendered = render_request("hello", &LoadedContext::default());
        assert_eq!(rendered, "Request: hello");
    }
}
