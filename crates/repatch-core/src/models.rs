//! Core data model: repository paths, file records, trees, tool calls, and
//! token usage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized, forward-slash-delimited path relative to the repository root.
///
/// No leading `/` and no `..` segments survive construction: `..` pops the
/// last resolved segment, `.` and empty segments are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoPath(String);

impl RepoPath {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.as_ref().split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        Self(segments.join("/"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory portion of the path; empty for top-level entries.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Final path segment.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Resolve a `./`- or `../`-relative reference against the directory of
    /// `owner`.
    pub fn join_relative(owner: &RepoPath, reference: &str) -> RepoPath {
        let dir = owner.parent();
        if dir.is_empty() {
            RepoPath::new(reference)
        } else {
            RepoPath::new(format!("{dir}/{reference}"))
        }
    }

    /// The same path with `suffix` appended verbatim (used for candidate
    /// probing, e.g. `".ts"` or `"/index.ts"`).
    pub fn with_suffix(&self, suffix: &str) -> RepoPath {
        RepoPath(format!("{}{}", self.0, suffix))
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RepoPath {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A file fetched from the remote, together with the revision identifier
/// (content-addressed blob id) required for a guarded write.
///
/// The revision is re-fetched for every write, never cached across one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: RepoPath,
    pub content: String,
    pub revision: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// Flat tree entry as returned by the remote tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: RepoPath,
    pub kind: EntryKind,
}

/// Nested tree node. Directories carry their children; files have none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub path: RepoPath,
    pub kind: EntryKind,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn from_entry(entry: TreeEntry) -> Self {
        Self {
            path: entry.path,
            kind: entry.kind,
            children: Vec::new(),
        }
    }
}

/// The assembled context handed to the model: a rendered repository tree
/// plus the loaded files in discovery order, deduplicated by resolved path.
#[derive(Debug, Clone, Default)]
pub struct LoadedContext {
    pub tree_rendering: String,
    pub files: Vec<FileRecord>,
}

/// A structured tool request emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCall {
    pub id: String,
    pub input: ToolInput,
}

/// Kind-specific tool payload. Unknown tool names survive parsing and fail
/// at dispatch, never at decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ToolInput {
    ReadFile {
        path: RepoPath,
    },
    StrReplace {
        path: RepoPath,
        old_str: String,
        new_str: String,
    },
    CreateFile {
        path: RepoPath,
        content: String,
    },
    SearchFiles {
        query: String,
    },
    Unknown {
        name: String,
    },
}

impl ToolInput {
    pub fn name(&self) -> &str {
        match self {
            Self::ReadFile { .. } => "read_file",
            Self::StrReplace { .. } => "str_replace",
            Self::CreateFile { .. } => "create_file",
            Self::SearchFiles { .. } => "search_files",
            Self::Unknown { name } => name,
        }
    }

    /// The path a call targets, where one exists.
    pub fn path(&self) -> Option<&RepoPath> {
        match self {
            Self::ReadFile { path }
            | Self::StrReplace { path, .. }
            | Self::CreateFile { path, .. } => Some(path),
            Self::SearchFiles { .. } | Self::Unknown { .. } => None,
        }
    }
}

/// Outcome of one tool call, positionally correlated with the call list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn ok(id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            tool_call_id: id.into(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failed(id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            tool_call_id: id.into(),
            success: false,
            output: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    Create,
    Edit,
    Delete,
}

/// Externally visible record of a mutation. Derived from successful
/// create/edit tool calls only; failed calls never produce one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileChange {
    pub path: RepoPath,
    pub action: ChangeAction,
    pub diff: Option<String>,
}

/// Token counters for one model round, or a running total across rounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u64,
    pub output: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: &TokenUsage) {
        self.input = self.input.saturating_add(other.input);
        self.output = self.output.saturating_add(other.output);
        self.cache_read = self.cache_read.saturating_add(other.cache_read);
        self.cache_write = self.cache_write.saturating_add(other.cache_write);
    }

    pub fn total(&self) -> u64 {
        self.input + self.output + self.cache_read + self.cache_write
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_path_normalizes_dots_and_empty_segments() {
        assert_eq!(RepoPath::new("./src//lib.ts").as_str(), "src/lib.ts");
        assert_eq!(RepoPath::new("a/b/../c").as_str(), "a/c");
        assert_eq!(RepoPath::new("/leading/slash").as_str(), "leading/slash");
    }

    #[test]
    fn test_join_relative_pops_segments() {
        let owner = RepoPath::new("a/b/c.ts");
        assert_eq!(RepoPath::join_relative(&owner, "../d").as_str(), "a/d");
        assert_eq!(RepoPath::join_relative(&owner, "./d").as_str(), "a/b/d");
        assert_eq!(
            RepoPath::join_relative(&owner, "../../x/y").as_str(),
            "x/y"
        );
    }

    #[test]
    fn test_join_relative_top_level_owner() {
        let owner = RepoPath::new("main.ts");
        assert_eq!(RepoPath::join_relative(&owner, "./util").as_str(), "util");
    }

    #[test]
    fn test_parent_and_file_name() {
        let path = RepoPath::new("src/lib/util.ts");
        assert_eq!(path.parent(), "src/lib");
        assert_eq!(path.file_name(), "util.ts");
        assert_eq!(RepoPath::new("top.ts").parent(), "");
    }

    #[test]
    fn test_usage_add_is_associative() {
        let a = TokenUsage {
            input: 5,
            output: 2,
            cache_read: 0,
            cache_write: 0,
        };
        let b = TokenUsage {
            input: 3,
            output: 1,
            cache_read: 0,
            cache_write: 0,
        };
        let mut stepwise = TokenUsage::default();
        stepwise.add(&a);
        stepwise.add(&b);
        let mut once = TokenUsage::default();
        once.add(&TokenUsage {
            input: 8,
            output: 3,
            cache_read: 0,
            cache_write: 0,
        });
        assert_eq!(stepwise, once);
    }

    #[test]
    fn test_tool_input_names() {
        let call = ToolInput::SearchFiles {
            query: "checkout".into(),
        };
        assert_eq!(call.name(), "search_files");
        let unknown = ToolInput::Unknown {
            name: "delete_repo".into(),
        };
        assert_eq!(unknown.name(), "delete_repo");
    }
}
