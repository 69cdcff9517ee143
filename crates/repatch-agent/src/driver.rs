//! Two-round tool-invocation loop.
//!
//! Round one sends the conversation plus assembled context and may come
//! back with tool calls. Those execute strictly in the order received —
//! later calls must observe earlier calls' side effects — and a second
//! round narrates the outcome. The loop never exceeds two model rounds no
//! matter how many tool calls round one produced.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use repatch_core::{
    ChangeAction, Error, FileChange, Result, TokenUsage, ToolCall, ToolInput, ToolResult,
};
use repatch_llm::{tool_definitions, Message, ModelProvider};
use repatch_remote::RepoAccessor;

use crate::editor::EditApplier;

/// States of one turn. Transitions are computed by [`advance`] alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Initial,
    RoundOne,
    ToolExecution,
    RoundTwo,
    Done,
}

/// Pure transition function. `pending_tool_calls` is only consulted when
/// leaving `RoundOne`; round-two tool calls never extend the loop.
pub fn advance(phase: TurnPhase, pending_tool_calls: bool) -> TurnPhase {
    match phase {
        TurnPhase::Initial => TurnPhase::RoundOne,
        TurnPhase::RoundOne if pending_tool_calls => TurnPhase::ToolExecution,
        TurnPhase::RoundOne => TurnPhase::Done,
        TurnPhase::ToolExecution => TurnPhase::RoundTwo,
        TurnPhase::RoundTwo => TurnPhase::Done,
        TurnPhase::Done => TurnPhase::Done,
    }
}

/// Result of one turn: final narrative text, every applied change, and the
/// usage summed across the rounds that ran.
#[derive(Debug, Clone, Default)]
pub struct TurnOutcome {
    pub text: String,
    pub changes: Vec<FileChange>,
    pub usage: TokenUsage,
}

pub struct ToolLoopDriver {
    provider: Arc<dyn ModelProvider>,
    repo: Arc<dyn RepoAccessor>,
    editor: EditApplier,
    branch: String,
}

impl ToolLoopDriver {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        repo: Arc<dyn RepoAccessor>,
        branch: impl Into<String>,
    ) -> Self {
        let branch = branch.into();
        Self {
            provider,
            editor: EditApplier::new(repo.clone(), branch.clone()),
            repo,
            branch,
        }
    }

    pub async fn run(
        &self,
        system: &str,
        mut messages: Vec<Message>,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let tools = tool_definitions();
        let mut phase = TurnPhase::Initial;
        let mut text = String::new();
        let mut usage = TokenUsage::default();
        let mut changes: Vec<FileChange> = Vec::new();
        let mut calls: Vec<ToolCall> = Vec::new();
        let mut results: Vec<ToolResult> = Vec::new();

        loop {
            phase = advance(phase, !calls.is_empty());
            match phase {
                TurnPhase::Initial => unreachable!("advance never yields Initial"),
                TurnPhase::RoundOne => {
                    let round = self.provider.send(system, &messages, &tools).await?;
                    usage.add(&round.usage);
                    text = round.text;
                    calls = round.tool_calls;
                    info!(tool_calls = calls.len(), "first model round complete");
                }
                TurnPhase::ToolExecution => {
                    results = self.execute_all(&calls, &mut changes, cancel).await;
                }
                TurnPhase::RoundTwo => {
                    let summary = summarize_results(&calls, &results);
                    if !text.is_empty() {
                        messages.push(Message::assistant(text.clone()));
                    }
                    messages.push(Message::user(format!(
                        "Tool execution finished:\n{summary}\n\nTell the user what was \
                         done and what failed, briefly. Do not request more tools."
                    )));
                    let round = self.provider.send(system, &messages, &[]).await?;
                    usage.add(&round.usage);
                    if !round.text.is_empty() {
                        text = round.text;
                    }
                    calls = Vec::new();
                }
                TurnPhase::Done => break,
            }
        }

        Ok(TurnOutcome {
            text,
            changes,
            usage,
        })
    }

    /// Dispatch every call sequentially, one fully completing before the
    /// next begins. Once cancellation is observed no further calls are
    /// dispatched; their results report the cancellation.
    async fn execute_all(
        &self,
        calls: &[ToolCall],
        changes: &mut Vec<FileChange>,
        cancel: &CancellationToken,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            if cancel.is_cancelled() {
                debug!(tool = call.input.name(), "cancelled, not dispatching");
                results.push(ToolResult::failed(&call.id, "turn cancelled before dispatch"));
                continue;
            }
            let (result, change) = self.dispatch(call).await;
            if let Some(change) = change {
                changes.push(change);
            }
            results.push(result);
        }
        results
    }

    async fn dispatch(&self, call: &ToolCall) -> (ToolResult, Option<FileChange>) {
        match &call.input {
            ToolInput::ReadFile { path } => match self.repo.get_file(path, &self.branch).await {
                Ok(Some(record)) => (ToolResult::ok(&call.id, record.content), None),
                Ok(None) => (
                    ToolResult::failed(&call.id, Error::not_found(path.to_string())),
                    None,
                ),
                Err(err) => (ToolResult::failed(&call.id, err), None),
            },
            ToolInput::SearchFiles { query } => match self.repo.search(query).await {
                Ok(paths) if paths.is_empty() => (ToolResult::ok(&call.id, "no matches"), None),
                Ok(paths) => {
                    let listing = paths
                        .iter()
                        .map(|p| p.as_str())
                        .collect::<Vec<_>>()
                        .join("\n");
                    (ToolResult::ok(&call.id, listing), None)
                }
                Err(err) => (ToolResult::failed(&call.id, err), None),
            },
            ToolInput::CreateFile { path, content } => {
                let message = format!("repatch: create {path}");
                match self
                    .repo
                    .write_file(path, content, &message, &self.branch, None)
                    .await
                {
                    Ok(_) => (
                        ToolResult::ok(&call.id, format!("created {path}")),
                        Some(FileChange {
                            path: path.clone(),
                            action: ChangeAction::Create,
                            diff: None,
                        }),
                    ),
                    Err(err) => (ToolResult::failed(&call.id, err), None),
                }
            }
            ToolInput::StrReplace {
                path,
                old_str,
                new_str,
            } => match self.editor.apply(path, old_str, new_str).await {
                Ok(edit) => (
                    ToolResult::ok(&call.id, format!("edited {path}")),
                    Some(FileChange {
                        path: path.clone(),
                        action: ChangeAction::Edit,
                        diff: Some(edit.diff),
                    }),
                ),
                Err(err) => (ToolResult::failed(&call.id, err), None),
            },
            ToolInput::Unknown { name } => (
                ToolResult::failed(&call.id, Error::UnknownTool { name: name.clone() }),
                None,
            ),
        }
    }
}

/// Human-readable per-tool summary fed to the follow-up round.
pub fn summarize_results(calls: &[ToolCall], results: &[ToolResult]) -> String {
    calls
        .iter()
        .zip(results)
        .map(|(call, result)| {
            let target = call
                .input
                .path()
                .map(|p| format!(" {p}"))
                .unwrap_or_default();
            if result.success {
                format!("- {}{}: ok", call.input.name(), target)
            } else {
                format!("- {}{}: failed ({})", call.input.name(), target, result.output)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_without_tool_calls_finishes_after_round_one() {
        let mut phase = TurnPhase::Initial;
        phase = advance(phase, false);
        assert_eq!(phase, TurnPhase::RoundOne);
        phase = advance(phase, false);
        assert_eq!(phase, TurnPhase::Done);
    }

    #[test]
    fn test_advance_with_tool_calls_runs_exactly_two_rounds() {
        let mut phase = TurnPhase::Initial;
        phase = advance(phase, true);
        assert_eq!(phase, TurnPhase::RoundOne);
        phase = advance(phase, true);
        assert_eq!(phase, TurnPhase::ToolExecution);
        phase = advance(phase, true);
        assert_eq!(phase, TurnPhase::RoundTwo);
        // Tool calls in round two never extend the loop.
        phase = advance(phase, true);
        assert_eq!(phase, TurnPhase::Done);
    }

    #[test]
    fn test_done_is_terminal() {
        assert_eq!(advance(TurnPhase::Done, true), TurnPhase::Done);
        assert_eq!(advance(TurnPhase::Done, false), TurnPhase::Done);
    }

    #[test]
    fn test_summary_includes_success_and_failure_lines() {
        let calls = vec![
            ToolCall {
                id: "a".into(),
                input: ToolInput::CreateFile {
                    path: "src/new.ts".into(),
                    content: String::new(),
                },
            },
            ToolCall {
                id: "b".into(),
                input: ToolInput::StrReplace {
                    path: "src/old.ts".into(),
                    old_str: "x".into(),
                    new_str: "y".into(),
                },
            },
        ];
        let results = vec![
            ToolResult::ok("a", "created src/new.ts"),
            ToolResult::failed("b", "'src/old.ts': target string occurs 2 times"),
        ];
        let summary = summarize_results(&calls, &results);
        assert!(summary.contains("create_file src/new.ts: ok"));
        assert!(summary.contains("str_replace src/old.ts: failed"));
    }
}
