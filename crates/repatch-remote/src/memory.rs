//! In-memory [`RepoAccessor`] used by tests and dry runs.
//!
//! Operations complete immediately in submission order, which is what the
//! deterministic context-loader tests rely on.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use repatch_core::{EntryKind, Error, FileRecord, RepoPath, Result, TreeEntry};

use crate::RepoAccessor;

#[derive(Debug, Clone)]
struct StoredFile {
    content: String,
    revision: u64,
}

#[derive(Default)]
pub struct InMemoryRepo {
    files: Mutex<BTreeMap<String, StoredFile>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repo pre-populated with `(path, content)` pairs.
    pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let repo = Self::new();
        for (path, content) in files {
            repo.insert(path, content);
        }
        repo
    }

    pub fn insert(&self, path: &str, content: &str) {
        let mut files = self.files.lock().unwrap();
        let revision = files.get(path).map(|f| f.revision + 1).unwrap_or(1);
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision,
            },
        );
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn content_of(&self, path: &str) -> Option<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .map(|f| f.content.clone())
    }
}

fn revision_string(path: &str, revision: u64) -> String {
    format!("{path}@{revision}")
}

#[async_trait]
impl RepoAccessor for InMemoryRepo {
    async fn get_tree(&self, _branch: &str) -> Result<Vec<TreeEntry>> {
        let files = self.files.lock().unwrap();
        let mut entries: Vec<TreeEntry> = Vec::new();
        let mut seen_dirs = std::collections::BTreeSet::new();

        for path in files.keys() {
            let repo_path = RepoPath::new(path);
            // Emit each ancestor directory once.
            let mut dir = repo_path.parent().to_string();
            while !dir.is_empty() && seen_dirs.insert(dir.clone()) {
                entries.push(TreeEntry {
                    path: RepoPath::new(&dir),
                    kind: EntryKind::Directory,
                });
                dir = RepoPath::new(&dir).parent().to_string();
            }
            entries.push(TreeEntry {
                path: repo_path,
                kind: EntryKind::File,
            });
        }
        Ok(entries)
    }

    async fn get_file(&self, path: &RepoPath, _branch: &str) -> Result<Option<FileRecord>> {
        let files = self.files.lock().unwrap();
        Ok(files.get(path.as_str()).map(|stored| FileRecord {
            path: path.clone(),
            content: stored.content.clone(),
            revision: revision_string(path.as_str(), stored.revision),
        }))
    }

    async fn write_file(
        &self,
        path: &RepoPath,
        content: &str,
        _message: &str,
        _branch: &str,
        expected_revision: Option<&str>,
    ) -> Result<String> {
        let mut files = self.files.lock().unwrap();
        let next = match files.get(path.as_str()) {
            Some(stored) => {
                if let Some(expected) = expected_revision {
                    if expected != revision_string(path.as_str(), stored.revision) {
                        return Err(Error::RevisionConflict {
                            path: path.to_string(),
                        });
                    }
                }
                stored.revision + 1
            }
            None => 1,
        };
        files.insert(
            path.to_string(),
            StoredFile {
                content: content.to_string(),
                revision: next,
            },
        );
        Ok(revision_string(path.as_str(), next))
    }

    async fn delete_file(
        &self,
        path: &RepoPath,
        _message: &str,
        _branch: &str,
        expected_revision: &str,
    ) -> Result<()> {
        let mut files = self.files.lock().unwrap();
        match files.get(path.as_str()) {
            None => Err(Error::not_found(path.to_string())),
            Some(stored) if expected_revision != revision_string(path.as_str(), stored.revision) => {
                Err(Error::RevisionConflict {
                    path: path.to_string(),
                })
            }
            Some(_) => {
                files.remove(path.as_str());
                Ok(())
            }
        }
    }

    /// Case-insensitive substring search over paths and contents.
    async fn search(&self, term: &str) -> Result<Vec<RepoPath>> {
        let needle = term.to_lowercase();
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .filter(|(path, stored)| {
                path.to_lowercase().contains(&needle)
                    || stored.content.to_lowercase().contains(&needle)
            })
            .map(|(path, _)| RepoPath::new(path))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_guarded_write_detects_stale_revision() {
        let repo = InMemoryRepo::with_files([("src/a.ts", "one")]);
        let path = RepoPath::new("src/a.ts");

        let record = repo.get_file(&path, "main").await.unwrap().unwrap();
        // Concurrent writer bumps the revision.
        repo.insert("src/a.ts", "two");

        let result = repo
            .write_file(&path, "three", "edit src/a.ts", "main", Some(&record.revision))
            .await;
        assert!(matches!(result, Err(Error::RevisionConflict { .. })));
    }

    #[tokio::test]
    async fn test_unguarded_write_creates() {
        let repo = InMemoryRepo::new();
        let path = RepoPath::new("docs/readme.md");
        let revision = repo
            .write_file(&path, "hi", "create docs/readme.md", "main", None)
            .await
            .unwrap();
        assert!(!revision.is_empty());
        assert_eq!(repo.content_of("docs/readme.md").unwrap(), "hi");
    }

    #[tokio::test]
    async fn test_delete_requires_matching_revision() {
        let repo = InMemoryRepo::with_files([("src/a.ts", "one")]);
        let path = RepoPath::new("src/a.ts");
        let record = repo.get_file(&path, "main").await.unwrap().unwrap();

        assert!(matches!(
            repo.delete_file(&path, "remove", "main", "bogus").await,
            Err(Error::RevisionConflict { .. })
        ));
        repo.delete_file(&path, "remove", "main", &record.revision)
            .await
            .unwrap();
        assert!(!repo.contains("src/a.ts"));
    }

    #[tokio::test]
    async fn test_tree_lists_directories_once() {
        let repo = InMemoryRepo::with_files([
            ("src/a.ts", ""),
            ("src/b.ts", ""),
            ("src/deep/c.ts", ""),
        ]);
        let tree = repo.get_tree("main").await.unwrap();
        let dirs: Vec<_> = tree
            .iter()
            .filter(|e| e.kind == EntryKind::Directory)
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(dirs, vec!["src", "src/deep"]);
    }
}
