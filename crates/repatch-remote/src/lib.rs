//! Repository access capability: the asynchronous, potentially-failing
//! operations the engine performs against a remote source repository.

pub mod github;
pub mod memory;

use async_trait::async_trait;
use repatch_core::{FileRecord, RepoPath, Result, TreeEntry};

pub use github::GithubClient;
pub use memory::InMemoryRepo;

/// Remote repository operations. Implemented over the GitHub REST API in
/// production and in memory for tests and dry runs.
#[async_trait]
pub trait RepoAccessor: Send + Sync {
    /// Full recursive file listing for a branch.
    async fn get_tree(&self, branch: &str) -> Result<Vec<TreeEntry>>;

    /// Fetch one file. `Ok(None)` when the path does not exist on the
    /// branch; errors are reserved for transport failures.
    async fn get_file(&self, path: &RepoPath, branch: &str) -> Result<Option<FileRecord>>;

    /// Create or update a file, returning the new revision identifier.
    ///
    /// When `expected_revision` is given the write only succeeds if the
    /// remote content still carries that revision; a mismatch surfaces as
    /// [`repatch_core::Error::RevisionConflict`].
    async fn write_file(
        &self,
        path: &RepoPath,
        content: &str,
        message: &str,
        branch: &str,
        expected_revision: Option<&str>,
    ) -> Result<String>;

    /// Delete a file guarded by its current revision.
    async fn delete_file(
        &self,
        path: &RepoPath,
        message: &str,
        branch: &str,
        expected_revision: &str,
    ) -> Result<()>;

    /// Full-text search over the repository, returning matching paths.
    async fn search(&self, term: &str) -> Result<Vec<RepoPath>>;
}
