//! Lexical extraction of intra-repository module references.

use once_cell::sync::Lazy;
use regex::Regex;

use repatch_core::RepoPath;

// `import ... from '<spec>'` / `export ... from '<spec>'`, including
// multi-line specifier lists.
static FROM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:import|export)\b[^;'"]*?\bfrom\s*['"]([^'"]+)['"]"#).unwrap()
});

// Side-effect and dynamic imports: `import '<spec>'`, `import('<spec>')`.
static BARE_IMPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bimport\s*\(?\s*['"]([^'"]+)['"]"#).unwrap());

static REQUIRE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

/// Scan `content` for locally-relative module references and resolve them
/// against the directory of `owner`.
///
/// Bare module names (package imports) are discarded; only `./` and `../`
/// references are intra-repository. The output may contain duplicates —
/// deduplication is the caller's responsibility.
pub fn extract_references(content: &str, owner: &RepoPath) -> Vec<RepoPath> {
    let mut references = Vec::new();
    for re in [&*FROM_RE, &*BARE_IMPORT_RE, &*REQUIRE_RE] {
        for capture in re.captures_iter(content) {
            let spec = &capture[1];
            if spec.starts_with("./") || spec.starts_with("../") {
                references.push(RepoPath::join_relative(owner, spec));
            }
        }
    }
    references
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_relative_imports() {
        let owner = RepoPath::new("src/pages/checkout.ts");
        let content = r#"
import { total } from "./pricing";
import Cart from '../components/cart';
import "./styles.css";
const helpers = require('./helpers');
"#;
        let refs = extract_references(content, &owner);
        let paths: Vec<&str> = refs.iter().map(|p| p.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "src/pages/pricing",
                "src/components/cart",
                "src/pages/styles.css",
                "src/pages/helpers",
            ]
        );
    }

    #[test]
    fn test_non_relative_references_discarded() {
        let owner = RepoPath::new("src/server.ts");
        let content = r#"
import express from "express";
import { z } from 'zod';
const fs = require('fs');
"#;
        assert!(extract_references(content, &owner).is_empty());
    }

    #[test]
    fn test_multiline_import_list() {
        let owner = RepoPath::new("src/app.ts");
        let content = "import {\n  a,\n  b,\n} from './wide';\n";
        let refs = extract_references(content, &owner);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_str(), "src/wide");
    }

    #[test]
    fn test_export_from() {
        let owner = RepoPath::new("src/index.ts");
        let refs = extract_references("export * from './api';", &owner);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].as_str(), "src/api");
    }

    #[test]
    fn test_duplicates_preserved() {
        let owner = RepoPath::new("src/a.ts");
        let content = "import x from './b';\nimport y from './b';\n";
        assert_eq!(extract_references(content, &owner).len(), 2);
    }
}
