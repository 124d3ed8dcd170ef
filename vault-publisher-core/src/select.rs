//! Selection engine: decides from local metadata which notes are shared and
//! which target repository each one belongs to.
//!
//! Selection never fails on bad input. A note with missing or malformed
//! frontmatter is simply not shared; an embed that does not resolve is logged
//! and skipped. The fail-open direction is always exclusion, never
//! publication.

use serde_yaml::Value;
use tracing::{debug, error};

use crate::contract::{NoteMeta, Vault, VaultError};
use crate::frontmatter::Frontmatter;
use crate::paths;
use crate::settings::{PublisherSettings, RepoAttribution};

/// Extensions accepted for embedded attachments.
pub const IMAGE_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "svg", "bmp", "gif"];

/// One shared note with its resolved remote path and target attribution.
/// Computed fresh on every pass, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareDecision {
    pub note: NoteMeta,
    pub remote_path: String,
    pub attribution: RepoAttribution,
}

/// Walk the vault and return a decision for every note currently shared,
/// across all target attributions.
pub async fn select_shared<V: Vault + ?Sized>(
    vault: &V,
    settings: &PublisherSettings,
) -> Result<Vec<ShareDecision>, VaultError> {
    let notes = vault.list_notes().await?;
    let mut decisions = Vec::new();
    for note in notes {
        let fm = vault.frontmatter(&note.path).await;
        if !is_shared(fm.as_ref(), &note, settings) {
            continue;
        }
        let attribution = attribution_for(fm.as_ref(), settings);
        let remote_path = paths::note_path(fm.as_ref(), &note, settings);
        decisions.push(ShareDecision {
            note,
            remote_path,
            attribution,
        });
    }
    debug!(shared = decisions.len(), "selection pass complete");
    Ok(decisions)
}

/// A note is shared iff its share key is exactly boolean true, it is not
/// under an excluded folder, and it is a markdown file.
pub fn is_shared(fm: Option<&Frontmatter>, note: &NoteMeta, settings: &PublisherSettings) -> bool {
    let Some(fm) = fm else {
        return false;
    };
    matches!(fm.get(&settings.share_key), Some(Value::Bool(true)))
        && !in_excluded_folder(&note.path, settings)
        && note.extension == "md"
}

fn in_excluded_folder(path: &str, settings: &PublisherSettings) -> bool {
    settings
        .excluded_folder_list()
        .iter()
        .any(|folder| path.contains(folder))
}

/// Target attribution for a note: the frontmatter `repo` override when
/// present and well-formed, else the configured default. The override is
/// either a `owner/repo` or `owner/repo/branch` string, or a mapping with
/// those keys.
pub fn attribution_for(fm: Option<&Frontmatter>, settings: &PublisherSettings) -> RepoAttribution {
    let default = &settings.attribution;
    let Some(value) = fm.and_then(|f| f.get("repo")) else {
        return default.clone();
    };
    match value {
        Value::String(s) => {
            let parts: Vec<&str> = s.split('/').map(str::trim).filter(|p| !p.is_empty()).collect();
            match parts.as_slice() {
                [owner, repo] => RepoAttribution {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch: default.branch.clone(),
                },
                [owner, repo, branch] => RepoAttribution {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    branch: branch.to_string(),
                },
                _ => {
                    debug!(value = %s, "unusable repo override, using default attribution");
                    default.clone()
                }
            }
        }
        Value::Mapping(map) => {
            let field = |key: &str| {
                map.get(&Value::String(key.to_string()))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            RepoAttribution {
                owner: field("owner").unwrap_or_else(|| default.owner.clone()),
                repo: field("repo").unwrap_or_else(|| default.repo.clone()),
                branch: field("branch").unwrap_or_else(|| default.branch.clone()),
            }
        }
        _ => default.clone(),
    }
}

/// Resolve a note's embeds to concrete image files. Unresolvable embeds and
/// non-image targets are skipped; neither fails the note's publication.
pub async fn linked_images<V: Vault + ?Sized>(vault: &V, note: &NoteMeta) -> Vec<NoteMeta> {
    let mut images = Vec::new();
    for link in vault.embeds(&note.path).await {
        match vault.resolve_embed(&link, &note.path).await {
            Some(target)
                if IMAGE_EXTENSIONS
                    .iter()
                    .any(|ext| target.extension.eq_ignore_ascii_case(ext)) =>
            {
                images.push(target)
            }
            Some(target) => {
                debug!(link = %link, file = %target.path, "embed is not a supported image type, skipping");
            }
            None => {
                error!(link = %link, note = %note.path, "could not resolve embedded attachment, skipping");
            }
        }
    }
    images
}
