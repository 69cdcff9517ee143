//! Unique-string replacement with an optimistic-concurrency write guard.

use std::sync::Arc;

use tracing::debug;

use repatch_core::{Error, RepoPath, Result};
use repatch_remote::RepoAccessor;

pub struct EditApplier {
    repo: Arc<dyn RepoAccessor>,
    branch: String,
}

/// A successfully applied edit: the new revision and a diff snippet for the
/// change record.
#[derive(Debug, Clone)]
pub struct AppliedEdit {
    pub path: RepoPath,
    pub revision: String,
    pub diff: String,
}

impl EditApplier {
    pub fn new(repo: Arc<dyn RepoAccessor>, branch: impl Into<String>) -> Self {
        Self {
            repo,
            branch: branch.into(),
        }
    }

    /// Replace `old_str` with `new_str` in `path`, requiring exactly one
    /// occurrence.
    ///
    /// The file content and revision are fetched fresh; the write carries
    /// that revision as its precondition, so a concurrent remote mutation
    /// surfaces as [`Error::RevisionConflict`] instead of being silently
    /// overwritten.
    pub async fn apply(
        &self,
        path: &RepoPath,
        old_str: &str,
        new_str: &str,
    ) -> Result<AppliedEdit> {
        let record = self
            .repo
            .get_file(path, &self.branch)
            .await?
            .ok_or_else(|| Error::not_found(path.to_string()))?;

        // Literal, non-overlapping occurrence count.
        let occurrences = record.content.matches(old_str).count();
        match occurrences {
            0 => {
                return Err(Error::not_found(format!("target string in {path}")));
            }
            1 => {}
            n => {
                return Err(Error::Ambiguous {
                    path: path.to_string(),
                    occurrences: n,
                });
            }
        }

        let updated = record.content.replacen(old_str, new_str, 1);
        let revision = self
            .repo
            .write_file(
                path,
                &updated,
                &format!("repatch: edit {path}"),
                &self.branch,
                Some(&record.revision),
            )
            .await?;

        debug!(path = %path, revision = %revision, "edit applied");
        Ok(AppliedEdit {
            path: path.clone(),
            revision,
            diff: edit_diff(old_str, new_str),
        })
    }
}

fn edit_diff(old_str: &str, new_str: &str) -> String {
    let mut out = String::new();
    for line in old_str.lines() {
        out.push_str("- ");
        out.push_str(line);
        out.push('\n');
    }
    for line in new_str.lines() {
        out.push_str("+ ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_diff_marks_lines() {
        let diff = edit_diff("a\nb", "c");
        assert_eq!(diff, "- a\n- b\n+ c\n");
    }
}
