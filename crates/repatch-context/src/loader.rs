//! Bounded-depth expansion over the import graph.
//!
//! Seeds start at depth 0. A file loaded at depth `d < max_depth`
//! contributes its references at `d + 1`; references of a file at the bound
//! are ignored entirely. All fetches within one wave run concurrently, and
//! any single failed fetch is treated as "file not found" without aborting
//! its siblings.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::future::join_all;
use tracing::{debug, warn};

use repatch_config::ContextConfig;
use repatch_core::{FileRecord, LoadedContext, RepoPath};
use repatch_remote::RepoAccessor;

use crate::imports::extract_references;
use crate::tree::{build_tree, render_tree};

/// Source-extension suffixes probed after the literal path, in priority
/// order.
pub const SOURCE_SUFFIXES: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Directory-index spellings probed last.
pub const INDEX_SUFFIXES: &[&str] = &["/index.ts", "/index.tsx", "/index.js"];

/// Candidate spellings for one unresolved reference, in the fixed priority
/// order. The first candidate that resolves wins; the rest are not tried.
pub fn candidate_spellings(path: &RepoPath) -> Vec<RepoPath> {
    let mut candidates = Vec::with_capacity(1 + SOURCE_SUFFIXES.len() + INDEX_SUFFIXES.len());
    candidates.push(path.clone());
    for suffix in SOURCE_SUFFIXES {
        candidates.push(path.with_suffix(suffix));
    }
    for suffix in INDEX_SUFFIXES {
        candidates.push(path.with_suffix(suffix));
    }
    candidates
}

/// Shared traversal state. Inserts act as claims: a branch must own the
/// claim on a spelling before it may fetch it, so two branches discovering
/// the same path concurrently never both fetch it.
#[derive(Default)]
struct TraversalState {
    /// Unresolved reference spellings already queued for probing.
    scheduled: HashSet<RepoPath>,
    /// Candidate spellings a fetch was ever issued for.
    attempted: HashSet<RepoPath>,
    /// Resolved paths present in the output.
    loaded: HashSet<RepoPath>,
}

pub struct ContextLoader {
    repo: Arc<dyn RepoAccessor>,
    branch: String,
    limits: ContextConfig,
}

impl ContextLoader {
    pub fn new(
        repo: Arc<dyn RepoAccessor>,
        branch: impl Into<String>,
        limits: ContextConfig,
    ) -> Self {
        Self {
            repo,
            branch: branch.into(),
            limits,
        }
    }

    /// Expand `seeds` to the transitive local dependency closure bounded by
    /// `max_depth`, and render the authoritative repository tree.
    ///
    /// Files appear in discovery order, deduplicated by resolved path. An
    /// empty seed set yields an empty file list, not an error.
    pub async fn load(&self, seeds: &[RepoPath], max_depth: usize) -> LoadedContext {
        let tree_rendering = match self.repo.get_tree(&self.branch).await {
            Ok(entries) => render_tree(&build_tree(entries)),
            Err(err) => {
                warn!(error = %err, "tree fetch failed, continuing without a tree");
                String::new()
            }
        };

        let state = Mutex::new(TraversalState::default());
        let mut files: Vec<FileRecord> = Vec::new();
        let mut total_chars = 0usize;
        let mut frontier: Vec<RepoPath> = seeds.to_vec();

        for depth in 0..=max_depth {
            if frontier.is_empty() {
                break;
            }

            let wave: Vec<RepoPath> = {
                let mut claimed = state.lock().unwrap();
                frontier
                    .drain(..)
                    .filter(|path| claimed.scheduled.insert(path.clone()))
                    .collect()
            };

            let fetched =
                join_all(wave.into_iter().map(|path| self.probe(path, &state))).await;

            let mut next = Vec::new();
            for mut record in fetched.into_iter().flatten() {
                if depth < max_depth {
                    next.extend(extract_references(&record.content, &record.path));
                }

                if total_chars >= self.limits.max_total_chars {
                    debug!(path = %record.path, "context budget exhausted, dropping file");
                    continue;
                }
                record.content = clip(record.content, self.limits.max_file_chars);
                total_chars += record.content.len();
                files.push(record);
            }

            frontier = next;
        }

        LoadedContext {
            tree_rendering,
            files,
        }
    }

    /// Try each candidate spelling in priority order, short-circuiting on
    /// the first that resolves. A failed fetch counts as "not found". Each
    /// candidate is claimed before the fetch is issued, so any resolved
    /// path is fetched at most once across the whole traversal no matter
    /// how many edges reach it.
    async fn probe(&self, path: RepoPath, state: &Mutex<TraversalState>) -> Option<FileRecord> {
        for candidate in candidate_spellings(&path) {
            {
                let mut claimed = state.lock().unwrap();
                if claimed.loaded.contains(&candidate) {
                    // Already in the output via another edge.
                    return None;
                }
                if !claimed.attempted.insert(candidate.clone()) {
                    continue;
                }
            }
            match self.repo.get_file(&candidate, &self.branch).await {
                Ok(Some(record)) => {
                    state.lock().unwrap().loaded.insert(record.path.clone());
                    return Some(record);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(path = %candidate, error = %err, "fetch failed, skipping candidate");
                }
            }
        }
        None
    }
}

fn clip(content: String, limit: usize) -> String {
    if content.len() <= limit {
        return content;
    }
    let mut end = limit;
    while !content.is_char_boundary(end) {
        end -= 1;
    }
    let mut clipped = content[..end].to_string();
    clipped.push_str("\n[truncated]");
    clipped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_order() {
        let spellings = candidate_spellings(&RepoPath::new("src/pricing"));
        let raw: Vec<&str> = spellings.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            raw,
            vec![
                "src/pricing",
                "src/pricing.ts",
                "src/pricing.tsx",
                "src/pricing.js",
                "src/pricing.jsx",
                "src/pricing/index.ts",
                "src/pricing/index.tsx",
                "src/pricing/index.js",
            ]
        );
    }

    #[test]
    fn test_clip_preserves_short_content() {
        assert_eq!(clip("short".to_string(), 100), "short");
    }

    #[test]
    fn test_clip_truncates_on_char_boundary() {
        let content = "é".repeat(100);
        let clipped = clip(content, 11);
        assert!(clipped.ends_with("[truncated]"));
        assert!(clipped.len() < 30);
    }
}
