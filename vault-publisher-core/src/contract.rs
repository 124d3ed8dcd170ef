//! # contract: interfaces between the core pipeline and the outside world
//!
//! This module defines the traits the publishing and reconciliation logic is
//! written against, plus the plain data types that cross those boundaries:
//!
//! - [`Vault`]: the local authoritative store (enumerate notes, read content,
//!   read frontmatter, resolve embedded attachments).
//! - [`RepoHost`]: the remote hosting API (contents read/write/delete, repo
//!   tree listing, workflow dispatch and run polling).
//! - [`Reporter`]: the single user-facing side channel for batch summaries.
//!
//! ## Mocking & Testing
//! All traits are annotated for `mockall` behind `any(test, feature =
//! "test-export-mocks")` so integration tests can drive the pipeline with
//! deterministic mocks instead of a network or a real vault.
//!
//! ## Error Handling
//! Vault failures use a boxed error type ([`VaultError`]); remote failures use
//! the typed [`HostError`], whose `Cancelled` variant is distinguished from
//! ordinary failures everywhere it is matched.

use async_trait::async_trait;
use mockall::automock;

use crate::frontmatter::Frontmatter;
use crate::settings::RepoAttribution;

/// A document in the local store. Identity is the store-relative path; `name`
/// is the file name including its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteMeta {
    pub path: String,
    pub name: String,
    pub extension: String,
}

/// A file currently present in a remote repository tree, as reported by the
/// inventory listing. `sha` is the version token required to update or delete
/// the object safely. Never cached across reconciliation passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub path: String,
    pub sha: String,
}

/// Result of probing a single remote path. A missing object is an expected
/// outcome (the first-publish case), so it is typed rather than signalled
/// through the error channel.
#[derive(Debug, Clone)]
pub enum RemoteProbe {
    Found(RemoteObject),
    NotFound,
}

/// The remote object behind a successful contents probe. `content` is the
/// decoded text when the host returned one (used for index protection checks).
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub sha: String,
    pub object_type: String,
    pub content: Option<String>,
}

/// Write payload for a contents upsert. The presence or absence of `sha` is
/// what the remote API uses to distinguish create from update.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PutBody {
    pub message: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

/// One workflow run as reported by the host's runs listing.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WorkflowRun {
    pub name: String,
    pub status: String,
}

/// Error type for [`Vault`] operations (simple boxed error).
pub type VaultError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for [`RepoHost`] operations.
///
/// `Cancelled` marks a request aborted by the caller; it is never counted or
/// reported as a failure by the batch loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host answered with a non-success status code.
    Status { code: u16, message: String },
    /// The request never produced a response (network, TLS, serialization).
    Transport(String),
    /// The enclosing task was cancelled while the request was in flight.
    Cancelled,
}

impl std::fmt::Display for HostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostError::Status { code, message } => write!(f, "host returned {code}: {message}"),
            HostError::Transport(msg) => write!(f, "transport error: {msg}"),
            HostError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

impl std::error::Error for HostError {}

/// Success/failure tallies for one batch of upload or delete operations.
/// Reset at the start of each batch, reported once at the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounters {
    pub succeeded: u32,
    pub failed: u32,
}

impl OutcomeCounters {
    pub fn is_empty(&self) -> bool {
        self.succeeded == 0 && self.failed == 0
    }
}

/// The local authoritative store. Read-only to the core: the pipeline never
/// mutates a note.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Vault: Send + Sync {
    /// Enumerate all markdown notes in the store.
    async fn list_notes(&self) -> Result<Vec<NoteMeta>, VaultError>;

    /// Read a note's raw text content.
    async fn read_text(&self, path: &str) -> Result<String, VaultError>;

    /// Read a binary attachment's content.
    async fn read_binary(&self, path: &str) -> Result<Vec<u8>, VaultError>;

    /// Parse a note's frontmatter block. Absent or malformed frontmatter is
    /// `None`, never an error.
    async fn frontmatter(&self, path: &str) -> Option<Frontmatter>;

    /// List the embed references found in a note.
    async fn embeds(&self, path: &str) -> Vec<String>;

    /// Resolve an embed reference to a concrete file, relative to the note it
    /// appears in. `None` when the link does not resolve.
    async fn resolve_embed(&self, link: &str, from: &str) -> Option<NoteMeta>;
}

/// The remote hosting API, keyed by attribution (owner/repo/branch) and path.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait RepoHost: Send + Sync {
    /// Probe the object at `path`. A 404 from the host is the typed
    /// [`RemoteProbe::NotFound`], not an error.
    async fn get_contents(
        &self,
        attribution: &RepoAttribution,
        path: &str,
    ) -> Result<RemoteProbe, HostError>;

    /// Create or update the object at `path`.
    async fn put_contents(
        &self,
        attribution: &RepoAttribution,
        path: &str,
        body: PutBody,
    ) -> Result<(), HostError>;

    /// Delete the object at `path` using its version token.
    async fn delete_contents(
        &self,
        attribution: &RepoAttribution,
        path: &str,
        message: &str,
        sha: &str,
        branch: &str,
    ) -> Result<(), HostError>;

    /// List every file currently present in the repository tree at `branch`.
    async fn list_repo_files(
        &self,
        attribution: &RepoAttribution,
        branch: &str,
    ) -> Result<Vec<RemoteFile>, HostError>;

    /// Fire a workflow-dispatch event for `workflow_id` on `git_ref`.
    async fn dispatch_workflow(
        &self,
        attribution: &RepoAttribution,
        workflow_id: &str,
        git_ref: &str,
    ) -> Result<(), HostError>;

    /// List recent workflow runs for the repository.
    async fn list_workflow_runs(
        &self,
        attribution: &RepoAttribution,
    ) -> Result<Vec<WorkflowRun>, HostError>;
}

/// User-facing notification channel: one summary per batch operation.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Reporter: Send + Sync {
    fn notice(&self, message: &str);
}
