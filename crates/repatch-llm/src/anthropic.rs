//! Anthropic Messages API implementation of [`ModelProvider`].

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use repatch_core::{Error, RepoPath, Result, TokenUsage, ToolCall, ToolInput};

use crate::provider::{Message, ModelProvider, ModelTurn};

const DEFAULT_API_BASE: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    model: String,
    api_key: String,
    api_base: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        Self::with_base(model, api_key, DEFAULT_API_BASE, max_tokens, timeout_secs)
    }

    pub fn with_base(
        model: impl Into<String>,
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::model)?;
        let api_base: String = api_base.into();
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            max_tokens,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
    #[serde(default)]
    cache_creation_input_tokens: u64,
}

/// Decode one `tool_use` block into a [`ToolInput`]. Unrecognized names
/// survive as `Unknown` and fail at dispatch rather than here.
fn parse_tool_input(name: &str, input: &Value) -> ToolInput {
    let text = |field: &str| input[field].as_str().unwrap_or_default().to_string();
    let path = |field: &str| RepoPath::new(input[field].as_str().unwrap_or_default());
    match name {
        "read_file" => ToolInput::ReadFile { path: path("path") },
        "str_replace" => ToolInput::StrReplace {
            path: path("path"),
            old_str: text("old_str"),
            new_str: text("new_str"),
        },
        "create_file" => ToolInput::CreateFile {
            path: path("path"),
            content: text("content"),
        },
        "search_files" => ToolInput::SearchFiles {
            query: text("query"),
        },
        other => ToolInput::Unknown {
            name: other.to_string(),
        },
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    async fn send(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[Value],
    ) -> Result<ModelTurn> {
        let url = format!("{}/v1/messages", self.api_base);
        let mut body = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "system": system,
            "messages": messages,
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools);
        }

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(Error::model)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::model(format!("API error {status}: {text}")));
        }

        let parsed: MessagesResponse = response.json().await.map_err(Error::model)?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();
        for block in parsed.content {
            match block {
                ContentBlock::Text { text: chunk } => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&chunk);
                }
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall {
                        id,
                        input: parse_tool_input(&name, &input),
                    });
                }
                ContentBlock::Other => {}
            }
        }

        let usage = TokenUsage {
            input: parsed.usage.input_tokens,
            output: parsed.usage.output_tokens,
            cache_read: parsed.usage.cache_read_input_tokens,
            cache_write: parsed.usage.cache_creation_input_tokens,
        };
        debug!(
            model = %self.model,
            tool_calls = tool_calls.len(),
            input_tokens = usage.input,
            output_tokens = usage.output,
            "model round complete"
        );

        Ok(ModelTurn {
            text,
            tool_calls,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_str_replace_input() {
        let input = json!({
            "path": "src/checkout.ts",
            "old_str": "total * 0.9",
            "new_str": "total * discount"
        });
        let parsed = parse_tool_input("str_replace", &input);
        match parsed {
            ToolInput::StrReplace {
                path,
                old_str,
                new_str,
            } => {
                assert_eq!(path.as_str(), "src/checkout.ts");
                assert_eq!(old_str, "total * 0.9");
                assert_eq!(new_str, "total * discount");
            }
            other => panic!("unexpected input: {other:?}"),
        }
    }

    #[test]
    fn test_parse_unknown_tool_survives() {
        let parsed = parse_tool_input("delete_branch", &json!({}));
        assert_eq!(
            parsed,
            ToolInput::Unknown {
                name: "delete_branch".to_string()
            }
        );
    }

    #[test]
    fn test_response_blocks_decode() {
        let raw = json!({
            "content": [
                { "type": "text", "text": "Fixing the bug." },
                { "type": "tool_use", "id": "tu_1", "name": "read_file",
                  "input": { "path": "src/app.ts" } }
            ],
            "usage": { "input_tokens": 12, "output_tokens": 7 }
        });
        let parsed: MessagesResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.content.len(), 2);
        assert_eq!(parsed.usage.input_tokens, 12);
        assert_eq!(parsed.usage.cache_read_input_tokens, 0);
    }
}
