use std::sync::Arc;

use async_trait::async_trait;

use repatch_config::ContextConfig;
use repatch_context::RelevanceSelector;
use repatch_core::{Error, FileRecord, RepoPath, Result, TreeEntry};
use repatch_remote::{InMemoryRepo, RepoAccessor};

#[tokio::test]
async fn request_keyword_selects_matching_seed() {
    let repo = Arc::new(InMemoryRepo::with_files([
        ("src/checkout.ts", "export function checkout() {}"),
        ("src/unrelated.ts", "export const nothing = 1;"),
    ]));
    let selector = RelevanceSelector::new(repo, &ContextConfig::default());

    let seeds = selector.select_seeds("fix the Checkout bug").await;
    assert_eq!(seeds, vec![RepoPath::new("src/checkout.ts")]);
}

#[tokio::test]
async fn no_keywords_yields_empty_seed_set() {
    let repo = Arc::new(InMemoryRepo::with_files([("src/app.ts", "export {};")]));
    let selector = RelevanceSelector::new(repo, &ContextConfig::default());
    assert!(selector.select_seeds("please make it nicer").await.is_empty());
}

#[tokio::test]
async fn seed_set_is_capped() {
    let repo = InMemoryRepo::new();
    for i in 0..10 {
        repo.insert(&format!("src/auth/file{i}.ts"), "auth logic");
    }
    let selector = RelevanceSelector::new(Arc::new(repo), &ContextConfig::default());

    let seeds = selector.select_seeds("the auth flow is broken").await;
    assert_eq!(seeds.len(), 5);
}

/// Accessor whose search always fails; reads still work.
struct BrokenSearchRepo {
    inner: InMemoryRepo,
}

#[async_trait]
impl RepoAccessor for BrokenSearchRepo {
    async fn get_tree(&self, branch: &str) -> Result<Vec<TreeEntry>> {
        self.inner.get_tree(branch).await
    }

    async fn get_file(&self, path: &RepoPath, branch: &str) -> Result<Option<FileRecord>> {
        self.inner.get_file(path, branch).await
    }

    async fn write_file(
        &self,
        path: &RepoPath,
        content: &str,
        message: &str,
        branch: &str,
        expected_revision: Option<&str>,
    ) -> Result<String> {
        self.inner
            .write_file(path, content, message, branch, expected_revision)
            .await
    }

    async fn delete_file(
        &self,
        path: &RepoPath,
        message: &str,
        branch: &str,
        expected_revision: &str,
    ) -> Result<()> {
        self.inner
            .delete_file(path, message, branch, expected_revision)
            .await
    }

    async fn search(&self, _term: &str) -> Result<Vec<RepoPath>> {
        Err(Error::remote("search backend down"))
    }
}

#[tokio::test]
async fn failing_search_degrades_to_empty() {
    let repo = Arc::new(BrokenSearchRepo {
        inner: InMemoryRepo::with_files([("src/checkout.ts", "checkout")]),
    });
    let selector = RelevanceSelector::new(repo, &ContextConfig::default());
    assert!(selector.select_seeds("fix the Checkout bug").await.is_empty());
}
