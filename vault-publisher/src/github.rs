//! # GitHub integration (CLI <-> core)
//!
//! This module bridges the [`RepoHost`] trait from the core crate to the
//! GitHub REST v3 API using `reqwest`. All transport, serialization and
//! status-code mapping live here; the core pipeline only sees the typed
//! contract.
//!
//! ## Client Usage
//! - Construct [`GithubClient`] from the environment (`GITHUB_TOKEN`).
//! - The contents probe maps a 404 to [`RemoteProbe::NotFound`] — a missing
//!   object is the expected first-publish case, not an error.
//! - The inventory listing walks the git tree of the target branch
//!   recursively and keeps only blobs.

use std::env;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use tracing::{debug, error, info};
use vault_publisher_core::contract::{
    HostError, PutBody, RemoteFile, RemoteObject, RemoteProbe, RepoHost, Reporter, WorkflowRun,
};
use vault_publisher_core::settings::RepoAttribution;

const DEFAULT_API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "vault-publisher";

pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(token: String) -> Self {
        GithubClient {
            http: reqwest::Client::new(),
            token,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API base (test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Construct from `GITHUB_TOKEN`. The environment is loaded once in
    /// `main`; this only reads it.
    pub fn new_from_env() -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        match env::var("GITHUB_TOKEN") {
            Ok(token) => {
                tracing::info!(token_set = !token.is_empty(), "Initialized GithubClient from environment");
                Ok(GithubClient::new(token))
            }
            Err(e) => {
                tracing::error!(error = ?e, "GITHUB_TOKEN missing in environment");
                Err(Box::new(e))
            }
        }
    }

    fn contents_url(&self, attribution: &RepoAttribution, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, attribution.owner, attribution.repo, path
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }
}

fn transport(e: reqwest::Error) -> HostError {
    HostError::Transport(e.to_string())
}

async fn status_error(resp: reqwest::Response) -> HostError {
    let code = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    HostError::Status { code, message }
}

#[derive(Deserialize)]
struct ContentsResponse {
    #[serde(rename = "type")]
    object_type: String,
    sha: String,
    content: Option<String>,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

#[derive(Deserialize)]
struct TreeEntry {
    path: String,
    sha: String,
    #[serde(rename = "type")]
    entry_type: String,
}

#[derive(Deserialize)]
struct RunsResponse {
    workflow_runs: Vec<WorkflowRun>,
}

#[async_trait]
impl RepoHost for GithubClient {
    async fn get_contents(
        &self,
        attribution: &RepoAttribution,
        path: &str,
    ) -> Result<RemoteProbe, HostError> {
        let url = self.contents_url(attribution, path);
        debug!(url = %url, "probing remote contents");
        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(transport)?;
        if resp.status().as_u16() == 404 {
            return Ok(RemoteProbe::NotFound);
        }
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let body: ContentsResponse = resp.json().await.map_err(transport)?;
        let content = body.content.and_then(|encoded| {
            let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
            BASE64
                .decode(compact)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        });
        Ok(RemoteProbe::Found(RemoteObject {
            sha: body.sha,
            object_type: body.object_type,
            content,
        }))
    }

    async fn put_contents(
        &self,
        attribution: &RepoAttribution,
        path: &str,
        body: PutBody,
    ) -> Result<(), HostError> {
        let url = self.contents_url(attribution, path);
        info!(repo = %attribution, path, update = body.sha.is_some(), "writing remote contents");
        let resp = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            let e = status_error(resp).await;
            error!(path, error = %e, "contents write failed");
            return Err(e);
        }
        Ok(())
    }

    async fn delete_contents(
        &self,
        attribution: &RepoAttribution,
        path: &str,
        message: &str,
        sha: &str,
        branch: &str,
    ) -> Result<(), HostError> {
        let url = self.contents_url(attribution, path);
        info!(repo = %attribution, path, "deleting remote contents");
        let resp = self
            .request(reqwest::Method::DELETE, &url)
            .json(&serde_json::json!({
                "message": message,
                "sha": sha,
                "branch": branch,
            }))
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            let e = status_error(resp).await;
            error!(path, error = %e, "contents delete failed");
            return Err(e);
        }
        Ok(())
    }

    async fn list_repo_files(
        &self,
        attribution: &RepoAttribution,
        branch: &str,
    ) -> Result<Vec<RemoteFile>, HostError> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base, attribution.owner, attribution.repo, branch
        );
        debug!(url = %url, "listing repository tree");
        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let body: TreeResponse = resp.json().await.map_err(transport)?;
        let files = body
            .tree
            .into_iter()
            .filter(|entry| entry.entry_type == "blob")
            .map(|entry| RemoteFile {
                path: entry.path,
                sha: entry.sha,
            })
            .collect();
        Ok(files)
    }

    async fn dispatch_workflow(
        &self,
        attribution: &RepoAttribution,
        workflow_id: &str,
        git_ref: &str,
    ) -> Result<(), HostError> {
        let url = format!(
            "{}/repos/{}/{}/actions/workflows/{}/dispatches",
            self.api_base, attribution.owner, attribution.repo, workflow_id
        );
        info!(repo = %attribution, workflow_id, git_ref, "dispatching workflow");
        let resp = self
            .request(reqwest::Method::POST, &url)
            .json(&serde_json::json!({ "ref": git_ref }))
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        Ok(())
    }

    async fn list_workflow_runs(
        &self,
        attribution: &RepoAttribution,
    ) -> Result<Vec<WorkflowRun>, HostError> {
        let url = format!(
            "{}/repos/{}/{}/actions/runs",
            self.api_base, attribution.owner, attribution.repo
        );
        let resp = self
            .request(reqwest::Method::GET, &url)
            .send()
            .await
            .map_err(transport)?;
        if !resp.status().is_success() {
            return Err(status_error(resp).await);
        }
        let body: RunsResponse = resp.json().await.map_err(transport)?;
        Ok(body.workflow_runs)
    }
}

/// Reporter backed by stdout: one line per batch summary.
pub struct StdoutReporter;

impl Reporter for StdoutReporter {
    fn notice(&self, message: &str) {
        println!("{message}");
    }
}
