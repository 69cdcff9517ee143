//! Type-safe configuration structs.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::validation::{validate_non_empty, validate_positive, Validate};

/// Root configuration aggregating all sections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub repo: RepoConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub context: ContextConfig,
}

impl Validate for Config {
    fn validate(&self) -> Result<()> {
        self.repo.validate()?;
        self.llm.validate()?;
        self.context.validate()?;
        Ok(())
    }
}

/// Remote repository coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Repository owner (user or organization)
    #[serde(default)]
    pub owner: String,

    /// Repository name
    #[serde(default)]
    pub name: String,

    /// Branch read from and written to
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            name: String::new(),
            branch: default_branch(),
        }
    }
}

impl Validate for RepoConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty("repo.owner", &self.owner)?;
        validate_non_empty("repo.name", &self.name)?;
        validate_non_empty("repo.branch", &self.branch)?;
        Ok(())
    }
}

fn default_branch() -> String {
    "main".to_string()
}

/// LLM (Large Language Model) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model name
    ///
    /// Examples: "claude-sonnet-4-5", "claude-haiku-4-5"
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,

    /// HTTP timeout per model call (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_base: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty("llm.model", &self.model)?;

        if self.max_tokens == 0 {
            return Err(ConfigError::validation("llm.max_tokens", "must be > 0"));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::validation("llm.timeout_secs", "must be > 0"));
        }

        if let Some(api_base) = &self.api_base {
            if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
                return Err(ConfigError::validation(
                    "llm.api_base",
                    format!("must start with http:// or https://, got: {api_base}"),
                ));
            }
        }

        Ok(())
    }
}

fn default_model() -> String {
    "claude-sonnet-4-5".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_timeout() -> u64 {
    120
}

/// Context-assembly limits and budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Import-graph expansion depth bound
    ///
    /// Seeds are depth 0; references of a file at the bound are ignored.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Maximum seed paths derived from one request
    #[serde(default = "default_max_seeds")]
    pub max_seeds: usize,

    /// Maximum search keywords extracted from one request
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,

    /// Per-file character budget in the assembled context
    #[serde(default = "default_max_file_chars")]
    pub max_file_chars: usize,

    /// Total character budget in the assembled context
    #[serde(default = "default_max_total_chars")]
    pub max_total_chars: usize,

    /// HTTP timeout per remote repository call (seconds)
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_secs: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_seeds: default_max_seeds(),
            max_keywords: default_max_keywords(),
            max_file_chars: default_max_file_chars(),
            max_total_chars: default_max_total_chars(),
            remote_timeout_secs: default_remote_timeout(),
        }
    }
}

impl Validate for ContextConfig {
    fn validate(&self) -> Result<()> {
        validate_positive("context.max_seeds", self.max_seeds)?;
        validate_positive("context.max_keywords", self.max_keywords)?;
        validate_positive("context.max_file_chars", self.max_file_chars)?;
        validate_positive("context.max_total_chars", self.max_total_chars)?;

        if self.max_total_chars < self.max_file_chars {
            return Err(ConfigError::validation(
                "context.max_total_chars",
                "must be >= context.max_file_chars",
            ));
        }
        if self.remote_timeout_secs == 0 {
            return Err(ConfigError::validation(
                "context.remote_timeout_secs",
                "must be > 0",
            ));
        }

        Ok(())
    }
}

fn default_max_depth() -> usize {
    2
}

fn default_max_seeds() -> usize {
    5
}

fn default_max_keywords() -> usize {
    3
}

fn default_max_file_chars() -> usize {
    24_000
}

fn default_max_total_chars() -> usize {
    96_000
}

fn default_remote_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_llm_is_valid() {
        assert!(LlmConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_model_invalid() {
        let config = LlmConfig {
            model: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_api_base() {
        let config = LlmConfig {
            api_base: Some("not-a-url".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_context_is_valid() {
        assert!(ContextConfig::default().validate().is_ok());
    }

    #[test]
    fn test_total_budget_below_file_budget_invalid() {
        let config = ContextConfig {
            max_file_chars: 1000,
            max_total_chars: 500,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_depth_is_valid() {
        // Depth 0 means "seeds only", a legitimate configuration.
        let config = ContextConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_repo_requires_coordinates() {
        assert!(RepoConfig::default().validate().is_err());
        let config = RepoConfig {
            owner: "acme".into(),
            name: "storefront".into(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
