//! Provider-agnostic conversation types and the tool schema offered to the
//! model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use repatch_core::{Result, TokenUsage, ToolCall};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// One model round: narrative text, zero or more tool calls, and the token
/// usage the round consumed.
#[derive(Debug, Clone, Default)]
pub struct ModelTurn {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub usage: TokenUsage,
}

#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn send(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<ModelTurn>;
}

/// JSON schema for the four repository tools the model may invoke.
pub fn tool_definitions() -> Vec<Value> {
    vec![
        json!({
            "name": "read_file",
            "description": "Read the full content of a file in the repository.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Path relative to the repository root" }
                },
                "required": ["path"]
            }
        }),
        json!({
            "name": "str_replace",
            "description": "Replace a string that occurs exactly once in a file. Include enough surrounding context to make the target unique.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Path relative to the repository root" },
                    "old_str": { "type": "string", "description": "Exact text to replace; must occur exactly once" },
                    "new_str": { "type": "string", "description": "Replacement text" }
                },
                "required": ["path", "old_str", "new_str"]
            }
        }),
        json!({
            "name": "create_file",
            "description": "Create a new file with the given content.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Path relative to the repository root" },
                    "content": { "type": "string", "description": "Full file content" }
                },
                "required": ["path", "content"]
            }
        }),
        json!({
            "name": "search_files",
            "description": "Full-text search over the repository, returning matching file paths.",
            "input_schema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search term" }
                },
                "required": ["query"]
            }
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definitions_cover_the_four_tools() {
        let names: Vec<String> = tool_definitions()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["read_file", "str_replace", "create_file", "search_files"]
        );
    }
}
