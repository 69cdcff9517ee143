//! Config loading: file format by extension, then environment overrides.

use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::types::Config;
use crate::validation::Validate;

/// File names probed by [`Config::load`], in order.
const DEFAULT_LOCATIONS: &[&str] = &[
    ".repatch.toml",
    ".repatch.yml",
    ".repatch.yaml",
    ".repatch.json",
];

impl Config {
    /// Load from the first default location that exists, falling back to
    /// built-in defaults when no file is present. Environment overrides
    /// apply either way.
    pub fn load() -> Result<Self> {
        for location in DEFAULT_LOCATIONS {
            let path = Path::new(location);
            if path.exists() {
                return Self::from_file(path);
            }
        }
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file. The format is chosen by extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = parse(path, &raw)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides:
    /// `REPATCH_REPO_OWNER`, `REPATCH_REPO_NAME`, `REPATCH_BRANCH`,
    /// `REPATCH_MODEL`.
    pub fn apply_env(&mut self) {
        if let Ok(owner) = std::env::var("REPATCH_REPO_OWNER") {
            self.repo.owner = owner;
        }
        if let Ok(name) = std::env::var("REPATCH_REPO_NAME") {
            self.repo.name = name;
        }
        if let Ok(branch) = std::env::var("REPATCH_BRANCH") {
            self.repo.branch = branch;
        }
        if let Ok(model) = std::env::var("REPATCH_MODEL") {
            self.llm.model = model;
        }
    }
}

fn parse(path: &Path, raw: &str) -> Result<Config> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match extension {
        "toml" => toml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "yml" | "yaml" => serde_yaml::from_str(raw).map_err(|e| parse_err(e.to_string())),
        "json" => serde_json::from_str(raw).map_err(|e| parse_err(e.to_string())),
        _ => Err(ConfigError::UnknownFormat {
            path: path.to_path_buf(),
        }),
    }
}
