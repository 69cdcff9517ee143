//! Error taxonomy shared across the workspace.
//!
//! Nothing here is fatal to a whole turn except `ModelUnavailable`: remote
//! failures inside fan-out retrieval or tool execution are caught at the
//! call site and folded into partial results.

use thiserror::Error;

/// Result type for repatch operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Path, file, or edit target is absent. Recoverable: skip and continue.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// The edit target string occurs more than once; a unique match is
    /// required before a replacement is applied.
    #[error("'{path}': target string occurs {occurrences} times, expected exactly one")]
    Ambiguous { path: String, occurrences: usize },

    /// The remote content changed between read and write. The guarded write
    /// was refused instead of silently overwriting.
    #[error("revision conflict on {path}: remote content changed underneath")]
    RevisionConflict { path: String },

    /// Transient network or API failure against the repository remote.
    #[error("remote repository unavailable: {message}")]
    RemoteUnavailable { message: String },

    /// The model requested a tool this engine does not register.
    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Total failure of the model conversation capability. The only error
    /// that aborts a turn.
    #[error("model conversation failed: {message}")]
    ModelUnavailable { message: String },
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn remote(message: impl ToString) -> Self {
        Self::RemoteUnavailable {
            message: message.to_string(),
        }
    }

    pub fn model(message: impl ToString) -> Self {
        Self::ModelUnavailable {
            message: message.to_string(),
        }
    }
}
