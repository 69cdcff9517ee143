//! Seed-path selection: derive a small set of candidate paths from the
//! request text, independent of the import graph.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use repatch_config::ContextConfig;
use repatch_core::RepoPath;
use repatch_remote::RepoAccessor;

/// Fixed vocabulary of code-structure nouns matched against request words.
const CODE_NOUNS: &[&str] = &[
    "api", "auth", "billing", "cache", "checkout", "component", "config",
    "controller", "database", "handler", "hook", "login", "middleware",
    "migration", "model", "payment", "queue", "route", "router", "schema",
    "search", "server", "service", "session", "signup", "upload", "webhook",
    "worker",
];

static FILENAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[A-Za-z0-9_][A-Za-z0-9_./-]*\.(?:tsx?|jsx?|mjs|cjs|json|css|scss|html|md|ya?ml|toml|py|rs|go|java|rb)\b",
    )
    .unwrap()
});

static CAMEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z0-9]+(?:[A-Z][a-z0-9]+)+\b").unwrap());

pub struct RelevanceSelector {
    repo: Arc<dyn RepoAccessor>,
    max_keywords: usize,
    max_seeds: usize,
}

impl RelevanceSelector {
    pub fn new(repo: Arc<dyn RepoAccessor>, limits: &ContextConfig) -> Self {
        Self {
            repo,
            max_keywords: limits.max_keywords,
            max_seeds: limits.max_seeds,
        }
    }

    /// Derive seed paths for a request. Keywords are searched concurrently;
    /// a failing search degrades to an empty result for that keyword. No
    /// keywords means no seeds, which is not an error.
    pub async fn select_seeds(&self, request: &str) -> Vec<RepoPath> {
        let keywords = extract_keywords(request, self.max_keywords);
        if keywords.is_empty() {
            debug!("no keywords extracted from request");
            return Vec::new();
        }

        let results = join_all(keywords.iter().map(|keyword| async move {
            match self.repo.search(keyword).await {
                Ok(paths) => paths,
                Err(err) => {
                    debug!(keyword = %keyword, error = %err, "search failed, skipping keyword");
                    Vec::new()
                }
            }
        }))
        .await;

        let mut seen = HashSet::new();
        let mut seeds: Vec<RepoPath> = results
            .into_iter()
            .flatten()
            .filter(|path| seen.insert(path.clone()))
            .collect();
        seeds.truncate(self.max_seeds);
        seeds
    }
}

/// Up to `cap` deduplicated keywords from three independent extractors:
/// the code-noun vocabulary, filenames with known extensions, and
/// capitalized identifiers.
pub fn extract_keywords(request: &str, cap: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();

    for word in request.split(|c: char| !c.is_ascii_alphanumeric()) {
        let lower = word.to_ascii_lowercase();
        if CODE_NOUNS.contains(&lower.as_str()) {
            push_unique(&mut keywords, lower);
        }
    }

    for found in FILENAME_RE.find_iter(request) {
        push_unique(&mut keywords, found.as_str().to_string());
    }

    for found in CAMEL_RE.find_iter(request) {
        push_unique(&mut keywords, found.as_str().to_string());
    }
    // Capitalized words past the first token also count as identifiers.
    for (idx, token) in request.split_whitespace().enumerate() {
        if idx == 0 {
            continue;
        }
        let word = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if word.len() < 2 {
            continue;
        }
        let mut chars = word.chars();
        if chars.next().is_some_and(|c| c.is_ascii_uppercase())
            && chars.all(|c| c.is_ascii_lowercase())
        {
            push_unique(&mut keywords, word.to_string());
        }
    }

    keywords.truncate(cap);
    keywords
}

fn push_unique(keywords: &mut Vec<String>, keyword: String) {
    if !keywords.iter().any(|k| k.eq_ignore_ascii_case(&keyword)) {
        keywords.push(keyword);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocabulary_keyword() {
        let keywords = extract_keywords("fix the Checkout bug", 3);
        assert_eq!(keywords, vec!["checkout"]);
    }

    #[test]
    fn test_filename_keyword() {
        let keywords = extract_keywords("the bug is in cart.ts somewhere", 3);
        assert_eq!(keywords, vec!["cart.ts"]);
    }

    #[test]
    fn test_camel_case_identifier() {
        let keywords = extract_keywords("why does PriceSummary render twice", 3);
        assert_eq!(keywords, vec!["PriceSummary"]);
    }

    #[test]
    fn test_union_is_deduplicated_and_capped() {
        let keywords = extract_keywords(
            "the checkout webhook in webhook.ts breaks OrderStatus and CartTotal",
            3,
        );
        assert_eq!(keywords.len(), 3);
        assert_eq!(keywords[0], "checkout");
        assert_eq!(keywords[1], "webhook");
        assert_eq!(keywords[2], "webhook.ts");
    }

    #[test]
    fn test_no_keywords() {
        assert!(extract_keywords("please make it better", 3).is_empty());
    }
}
