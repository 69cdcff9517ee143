//! Configuration for repatch.
//!
//! Supports TOML, YAML, and JSON files selected by extension, with
//! environment-variable overrides for the values that commonly differ per
//! deployment (repository coordinates, model id).
//!
//! # Example
//!
//! ```no_run
//! use repatch_config::Config;
//!
//! // Load from the default location (.repatch.{toml,yml,yaml,json})
//! let config = Config::load()?;
//!
//! // Or from a specific file
//! let config = Config::from_file("repatch.toml")?;
//! # Ok::<(), repatch_config::ConfigError>(())
//! ```

pub mod error;
pub mod loader;
pub mod types;
pub mod validation;

pub use error::{ConfigError, Result};
pub use types::{Config, ContextConfig, LlmConfig, RepoConfig};
pub use validation::Validate;
