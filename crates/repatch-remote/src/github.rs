//! GitHub REST implementation of [`RepoAccessor`].

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use repatch_core::{EntryKind, Error, FileRecord, RepoPath, Result, TreeEntry};

use crate::RepoAccessor;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "repatch";

pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    owner: String,
    repo: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        Self::with_base(owner, repo, token, DEFAULT_API_BASE, timeout_secs)
    }

    pub fn with_base(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
        api_base: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::remote)?;
        let api_base: String = api_base.into();
        Ok(Self {
            http,
            token: token.into(),
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
        })
    }

    fn contents_url(&self, path: &RepoPath) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .bearer_auth(&self.token)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
    }
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeItem>,
}

#[derive(Debug, Deserialize)]
struct TreeItem {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Deserialize)]
struct WriteResponse {
    content: WrittenContent,
}

#[derive(Debug, Deserialize)]
struct WrittenContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    path: String,
}

/// GitHub wraps base64 blobs at 60 columns; strip the newlines first.
fn decode_blob(content: &str) -> Result<String> {
    let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).map_err(Error::remote)?;
    String::from_utf8(bytes).map_err(Error::remote)
}

#[async_trait]
impl RepoAccessor for GithubClient {
    async fn get_tree(&self, branch: &str) -> Result<Vec<TreeEntry>> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, self.owner, self.repo, branch
        );
        let response = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(Error::remote)?;

        if !response.status().is_success() {
            return Err(Error::remote(format!(
                "tree fetch failed with {}",
                response.status()
            )));
        }

        let parsed: TreeResponse = response.json().await.map_err(Error::remote)?;
        Ok(parsed
            .tree
            .into_iter()
            .map(|item| TreeEntry {
                path: RepoPath::new(&item.path),
                kind: if item.kind == "tree" {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            })
            .collect())
    }

    async fn get_file(&self, path: &RepoPath, branch: &str) -> Result<Option<FileRecord>> {
        let url = format!("{}?ref={}", self.contents_url(path), branch);
        let response = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(Error::remote)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let parsed: ContentsResponse = response.json().await.map_err(Error::remote)?;
                if parsed.encoding != "base64" {
                    debug!(path = %path, encoding = %parsed.encoding, "unexpected blob encoding");
                }
                Ok(Some(FileRecord {
                    path: path.clone(),
                    content: decode_blob(&parsed.content)?,
                    revision: parsed.sha,
                }))
            }
            status => Err(Error::remote(format!("file fetch failed with {status}"))),
        }
    }

    async fn write_file(
        &self,
        path: &RepoPath,
        content: &str,
        message: &str,
        branch: &str,
        expected_revision: Option<&str>,
    ) -> Result<String> {
        let mut body = json!({
            "message": message,
            "content": BASE64.encode(content.as_bytes()),
            "branch": branch,
        });
        if let Some(sha) = expected_revision {
            body["sha"] = json!(sha);
        }

        let response = self
            .request(self.http.put(self.contents_url(path)))
            .json(&body)
            .send()
            .await
            .map_err(Error::remote)?;

        match response.status() {
            // 409 is the documented conflict status; 422 is returned when
            // the supplied sha no longer matches the blob.
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY
                if expected_revision.is_some() =>
            {
                Err(Error::RevisionConflict {
                    path: path.to_string(),
                })
            }
            status if status.is_success() => {
                let parsed: WriteResponse = response.json().await.map_err(Error::remote)?;
                Ok(parsed.content.sha)
            }
            status => Err(Error::remote(format!("file write failed with {status}"))),
        }
    }

    async fn delete_file(
        &self,
        path: &RepoPath,
        message: &str,
        branch: &str,
        expected_revision: &str,
    ) -> Result<()> {
        let body = json!({
            "message": message,
            "sha": expected_revision,
            "branch": branch,
        });

        let response = self
            .request(self.http.delete(self.contents_url(path)))
            .json(&body)
            .send()
            .await
            .map_err(Error::remote)?;

        match response.status() {
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(Error::RevisionConflict {
                    path: path.to_string(),
                })
            }
            StatusCode::NOT_FOUND => Err(Error::not_found(path.to_string())),
            status if status.is_success() => Ok(()),
            status => Err(Error::remote(format!("file delete failed with {status}"))),
        }
    }

    async fn search(&self, term: &str) -> Result<Vec<RepoPath>> {
        let url = format!(
            "{}/search/code?q={}+repo:{}/{}",
            self.api_base,
            urlencode(term),
            self.owner,
            self.repo
        );
        let response = self
            .request(self.http.get(&url))
            .send()
            .await
            .map_err(Error::remote)?;

        if !response.status().is_success() {
            return Err(Error::remote(format!(
                "code search failed with {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response.json().await.map_err(Error::remote)?;
        Ok(parsed
            .items
            .into_iter()
            .map(|item| RepoPath::new(&item.path))
            .collect())
    }
}

/// Minimal percent-encoding for search terms (space and reserved query
/// characters only; GitHub accepts the rest verbatim).
fn urlencode(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '&' => out.push_str("%26"),
            '+' => out.push_str("%2B"),
            '#' => out.push_str("%23"),
            _ => out.push(c),
        }
    }
    out
}
