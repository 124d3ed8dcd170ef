//! Deletion reconciler: diffs the local selection against the remote
//! inventory and deletes what is no longer wanted.
//!
//! One reconciliation pass covers exactly one attribution. The local
//! correlation set is built across *all* attributions, because a markdown
//! file that looks orphaned from this target's perspective may still be
//! wanted by another target publishing to the same path. Files whose path
//! contains "index" get a remote-side protection check before deletion.
//!
//! Deletion cannot proceed without a ground truth of what exists remotely,
//! so inventory failures propagate. An unconfigured scope is a configuration
//! error, never "nothing to delete".

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::contract::{
    HostError, OutcomeCounters, RemoteFile, RemoteProbe, RepoHost, Reporter, Vault,
};
use crate::frontmatter::{parse_frontmatter, ProtectionFlags};
use crate::select::{self, ShareDecision};
use crate::settings::{Placement, PublisherSettings, RepoAttribution};

/// Extensions treated as publishable attachments when scanning the remote
/// inventory.
const ATTACHMENT_EXTENSIONS: [&str; 7] = ["png", "jpg", "jpeg", "svg", "bmp", "gif", "pdf"];

#[derive(Debug)]
pub enum PruneError {
    /// Undefined deletion scope or other unusable configuration. Fatal.
    Config(String),
    /// The inventory listing or another remote call failed hard.
    Host(HostError),
    /// The local selection pass failed.
    Vault(String),
}

impl From<HostError> for PruneError {
    fn from(e: HostError) -> Self {
        PruneError::Host(e)
    }
}

/// Exclusion rules compiled once per reconciliation pass. A rule delimited
/// by slashes (`/pattern/flags`) is a regex; anything else is a trimmed,
/// case-sensitive substring. Empty rules and delimited rules whose pattern
/// does not compile are ignored.
pub struct ExclusionRules {
    rules: Vec<ExclusionRule>,
}

enum ExclusionRule {
    Pattern(Regex),
    Substring(String),
}

impl ExclusionRules {
    pub fn compile(raw: &[String]) -> Self {
        let mut rules = Vec::new();
        for rule in raw {
            let rule = rule.trim();
            if rule.is_empty() {
                continue;
            }
            match split_delimited(rule) {
                Some((pattern, flags)) => {
                    // Only flags with a Rust-regex equivalent carry over.
                    let inline: String =
                        flags.chars().filter(|f| matches!(f, 'i' | 'm' | 's')).collect();
                    let pattern = if inline.is_empty() {
                        pattern.to_string()
                    } else {
                        format!("(?{inline}){pattern}")
                    };
                    match Regex::new(&pattern) {
                        Ok(re) => rules.push(ExclusionRule::Pattern(re)),
                        Err(e) => {
                            warn!(rule, error = %e, "exclusion rule pattern did not compile, ignoring rule");
                        }
                    }
                }
                None => rules.push(ExclusionRule::Substring(rule.to_string())),
            }
        }
        ExclusionRules { rules }
    }

    /// True when `path` matches any compiled rule.
    pub fn is_excluded(&self, path: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            ExclusionRule::Pattern(re) => re.is_match(path),
            ExclusionRule::Substring(s) => path.trim().contains(s.as_str()),
        })
    }
}

/// Split a `/pattern/flags` rule into its parts. The last slash delimits the
/// flags, which must all come from the source flag alphabet.
fn split_delimited(rule: &str) -> Option<(&str, &str)> {
    let rest = rule.strip_prefix('/')?;
    let idx = rest.rfind('/')?;
    let (pattern, flags) = (&rest[..idx], &rest[idx + 1..]);
    if flags.chars().all(|c| matches!(c, 'i' | 'g' | 'm' | 's' | 'u' | 'y')) {
        Some((pattern, flags))
    } else {
        None
    }
}

/// Scope filter over the raw inventory: keep only files plausibly under this
/// publisher's management. Returns `None` when no scope is configured at all,
/// which callers must treat as a configuration error.
pub fn filter_repo_files(
    files: Vec<RemoteFile>,
    settings: &PublisherSettings,
) -> Option<Vec<RemoteFile>> {
    if settings.default_folder.is_empty()
        || (settings.placement == Placement::Frontmatter && settings.root_folder.is_empty())
    {
        return None;
    }
    let rules = ExclusionRules::compile(&settings.exclusion_rules);
    let kept = files
        .into_iter()
        .filter(|f| {
            let in_scope = f.path.contains(&settings.default_folder)
                || (settings.placement == Placement::Frontmatter
                    && f.path.contains(&settings.root_folder))
                || (!settings.image_folder.is_empty() && f.path.contains(&settings.image_folder));
            in_scope
                && !rules.is_excluded(&f.path)
                && (is_attachment(&f.path) || f.path.ends_with(".md"))
        })
        .collect();
    Some(kept)
}

fn is_attachment(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| {
            ATTACHMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Run one reconciliation pass for `attribution`. `shared` is the local
/// correlation set across all attributions, computed once per batch by
/// [`reconcile_all`].
pub async fn reconcile<H, R>(
    host: &H,
    reporter: &R,
    settings: &PublisherSettings,
    shared: &[ShareDecision],
    attribution: &RepoAttribution,
    silent: bool,
    cancel: &CancellationToken,
) -> Result<OutcomeCounters, PruneError>
where
    H: RepoHost + ?Sized,
    R: Reporter + ?Sized,
{
    let inventory = host
        .list_repo_files(attribution, &attribution.branch)
        .await?;
    let Some(in_scope) = filter_repo_files(inventory, settings) else {
        return Err(PruneError::Config(scope_error(settings)));
    };
    info!(repo = %attribution, in_scope = in_scope.len(), "starting deletion reconciliation");

    let mut counters = OutcomeCounters::default();
    let mut cancelled = false;
    for file in &in_scope {
        if cancel.is_cancelled() {
            debug!("reconciliation cancelled, stopping");
            cancelled = true;
            break;
        }
        if !needs_deletion(file, shared, attribution) {
            continue;
        }
        if file.path.contains("index") {
            match index_protected(host, attribution, &file.path).await {
                Ok(true) => {
                    debug!(path = %file.path, "index file protected, keeping");
                    continue;
                }
                Ok(false) => {}
                Err(HostError::Cancelled) => {
                    cancelled = true;
                    break;
                }
                Err(e) => {
                    error!(path = %file.path, error = %e, "index protection check failed, keeping file");
                    continue;
                }
            }
        }
        debug!(path = %file.path, repo = %attribution, "deleting remote file");
        match host
            .delete_contents(
                attribution,
                &file.path,
                "Delete file",
                &file.sha,
                &attribution.branch,
            )
            .await
        {
            Ok(()) => counters.succeeded += 1,
            Err(HostError::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(e) => {
                error!(path = %file.path, error = %e, "delete failed");
                counters.failed += 1;
            }
        }
    }

    // A cancelled pass reports nothing.
    if !silent && !cancelled {
        reporter.notice(&delete_summary(&counters));
    }
    Ok(counters)
}

/// Reconcile every attribution currently targeted by the local selection,
/// sequentially, plus the configured default.
pub async fn reconcile_all<V, H, R>(
    vault: &V,
    host: &H,
    reporter: &R,
    settings: &PublisherSettings,
    silent: bool,
    cancel: &CancellationToken,
) -> Result<Vec<OutcomeCounters>, PruneError>
where
    V: Vault + ?Sized,
    H: RepoHost + ?Sized,
    R: Reporter + ?Sized,
{
    let shared = select::select_shared(vault, settings)
        .await
        .map_err(|e| PruneError::Vault(e.to_string()))?;

    let mut attributions = vec![settings.attribution.clone()];
    for decision in &shared {
        if !attributions.contains(&decision.attribution) {
            attributions.push(decision.attribution.clone());
        }
    }

    let mut outcomes = Vec::new();
    for attribution in &attributions {
        if cancel.is_cancelled() {
            break;
        }
        outcomes.push(reconcile(host, reporter, settings, &shared, attribution, silent, cancel).await?);
    }
    Ok(outcomes)
}

/// Eligibility decision for one in-scope remote file.
///
/// A file still mapped by any local selection is kept, unless it is a
/// markdown file wanted only by a *different* attribution than the one being
/// reconciled; attachments referenced anywhere are never deleted.
pub fn needs_deletion(
    file: &RemoteFile,
    shared: &[ShareDecision],
    attribution: &RepoAttribution,
) -> bool {
    let in_vault = shared.iter().any(|d| d.remote_path == file.path);
    let is_markdown = file.path.trim().ends_with(".md");
    let markdown_for_another_repo = is_markdown
        && !shared
            .iter()
            .any(|d| d.remote_path == file.path && d.attribution == *attribution);
    if in_vault {
        markdown_for_another_repo
    } else {
        true
    }
}

/// Fetch an index-like file's own frontmatter and decide whether deletion is
/// suppressed. A vanished file is simply not protected; a file without a
/// parseable share flag is.
async fn index_protected<H>(
    host: &H,
    attribution: &RepoAttribution,
    path: &str,
) -> Result<bool, HostError>
where
    H: RepoHost + ?Sized,
{
    match host.get_contents(attribution, path).await? {
        RemoteProbe::NotFound => Ok(false),
        RemoteProbe::Found(obj) => {
            let Some(content) = obj.content else {
                return Ok(true);
            };
            let protected = match parse_frontmatter(&content) {
                Some(fm) => ProtectionFlags::from_frontmatter(&fm).forbids_deletion(),
                // No metadata block means no share flag, which protects.
                None => true,
            };
            Ok(protected)
        }
    }
}

fn scope_error(settings: &PublisherSettings) -> String {
    if settings.default_folder.is_empty() {
        "no default publish folder configured; set `default_folder` in the settings".to_string()
    } else {
        "frontmatter placement is enabled but no root folder is configured; set `root_folder` in the settings"
            .to_string()
    }
}

fn delete_summary(counters: &OutcomeCounters) -> String {
    if counters.is_empty() {
        return "No file deleted".to_string();
    }
    let mut msg = String::new();
    if counters.succeeded > 0 {
        msg.push_str(&format!("Successfully deleted {} file(s)", counters.succeeded));
    }
    if counters.failed > 0 {
        if !msg.is_empty() {
            msg.push_str(", ");
        }
        msg.push_str(&format!("failed to delete {} file(s)", counters.failed));
    }
    msg
}
