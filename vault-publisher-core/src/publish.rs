//! Upsert publisher: pushes one note (and its embedded attachments) to its
//! target repository, and runs whole-vault publish batches.
//!
//! The create-vs-update decision is made by probing the remote path first. A
//! missing object is the expected first-publish case and is typed as
//! [`RemoteProbe::NotFound`]; only the write itself can fail the operation.
//! Missing repository identity is a configuration error and aborts the whole
//! batch, not just one file.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::{debug, error, info};

use crate::contract::{
    HostError, NoteMeta, OutcomeCounters, PutBody, RemoteProbe, RepoHost, Reporter, Vault,
};
use crate::paths;
use crate::select::{self, ShareDecision};
use crate::settings::{PublisherSettings, RepoAttribution};

/// Name of the manifest rewritten on whole-vault batches.
pub const MANIFEST_NAME: &str = "vault_published.json";

#[derive(Debug)]
pub enum PublishError {
    /// Missing or unusable configuration. Fatal to the whole batch.
    Config(String),
    /// A remote call failed.
    Host(HostError),
    /// The local store could not be read.
    Vault(String),
}

impl From<HostError> for PublishError {
    fn from(e: HostError) -> Self {
        PublishError::Host(e)
    }
}

/// Publish a single note if it is currently shared. Returns `Ok(false)` when
/// the note is not shared (nothing was sent), `Ok(true)` after a successful
/// upload.
pub async fn publish_note<V, H>(
    vault: &V,
    host: &H,
    settings: &PublisherSettings,
    note: &NoteMeta,
) -> Result<bool, PublishError>
where
    V: Vault + ?Sized,
    H: RepoHost + ?Sized,
{
    let fm = vault.frontmatter(&note.path).await;
    if !select::is_shared(fm.as_ref(), note, settings) {
        debug!(note = %note.path, "note is not shared, skipping");
        return Ok(false);
    }
    let attribution = select::attribution_for(fm.as_ref(), settings);
    let remote_path = paths::note_path(fm.as_ref(), note, settings);

    let text = vault
        .read_text(&note.path)
        .await
        .map_err(|e| PublishError::Vault(e.to_string()))?;
    info!(note = %note.path, remote = %remote_path, repo = %attribution, "publishing note");
    upsert(
        host,
        &attribution,
        &remote_path,
        BASE64.encode(text.as_bytes()),
        &note.name,
    )
    .await?;

    if settings.transfer_embeds {
        for image in select::linked_images(vault, note).await {
            if let Err(e) = upload_image(vault, host, settings, &attribution, &image).await {
                match e {
                    PublishError::Config(msg) => return Err(PublishError::Config(msg)),
                    PublishError::Host(HostError::Cancelled) => {
                        return Err(PublishError::Host(HostError::Cancelled))
                    }
                    other => {
                        error!(image = %image.path, error = ?other, "attachment upload failed, continuing");
                    }
                }
            }
        }
    }
    Ok(true)
}

/// Publish every shared note, then rewrite the manifest. Per-note failures
/// are counted and do not stop the batch; configuration errors abort it.
pub async fn publish_vault<V, H, R>(
    vault: &V,
    host: &H,
    reporter: &R,
    settings: &PublisherSettings,
    silent: bool,
) -> Result<OutcomeCounters, PublishError>
where
    V: Vault + ?Sized,
    H: RepoHost + ?Sized,
    R: Reporter + ?Sized,
{
    let decisions = select::select_shared(vault, settings)
        .await
        .map_err(|e| PublishError::Vault(e.to_string()))?;
    info!(shared = decisions.len(), "starting whole-vault publish batch");

    let mut counters = OutcomeCounters::default();
    let mut cancelled = false;
    for decision in &decisions {
        match publish_note(vault, host, settings, &decision.note).await {
            Ok(true) => counters.succeeded += 1,
            Ok(false) => {}
            Err(PublishError::Config(msg)) => {
                if !silent {
                    reporter.notice(&format!("Configuration error: {msg}"));
                }
                return Err(PublishError::Config(msg));
            }
            Err(PublishError::Host(HostError::Cancelled)) => {
                debug!("publish batch cancelled, stopping");
                cancelled = true;
                break;
            }
            Err(e) => {
                error!(note = %decision.note.path, error = ?e, "publish failed for note");
                counters.failed += 1;
            }
        }
    }

    // A cancelled batch rewrites nothing and reports nothing.
    if !cancelled {
        if let Err(e) = upload_manifest(host, settings, &decisions).await {
            error!(error = ?e, "manifest rewrite failed");
        }
        if !silent {
            reporter.notice(&publish_summary(&counters));
        }
    }
    Ok(counters)
}

/// Upload one embedded attachment as binary content.
pub async fn upload_image<V, H>(
    vault: &V,
    host: &H,
    settings: &PublisherSettings,
    attribution: &RepoAttribution,
    image: &NoteMeta,
) -> Result<(), PublishError>
where
    V: Vault + ?Sized,
    H: RepoHost + ?Sized,
{
    let bytes = vault
        .read_binary(&image.path)
        .await
        .map_err(|e| PublishError::Vault(e.to_string()))?;
    let remote_path = paths::image_path(image, settings);
    debug!(image = %image.path, remote = %remote_path, "uploading attachment");
    upsert(
        host,
        attribution,
        &remote_path,
        BASE64.encode(&bytes),
        &image.name,
    )
    .await
}

/// Rewrite the manifest listing all currently shared note names as JSON.
/// Only whole-vault batches call this.
pub async fn upload_manifest<H>(
    host: &H,
    settings: &PublisherSettings,
    decisions: &[ShareDecision],
) -> Result<(), PublishError>
where
    H: RepoHost + ?Sized,
{
    if decisions.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = decisions.iter().map(|d| d.note.name.as_str()).collect();
    let json = serde_json::to_string(&names)
        .map_err(|e| PublishError::Vault(format!("manifest serialization failed: {e}")))?;
    let remote_path = manifest_path(settings);
    debug!(remote = %remote_path, notes = names.len(), "rewriting publish manifest");
    upsert(
        host,
        &settings.attribution,
        &remote_path,
        BASE64.encode(json.as_bytes()),
        MANIFEST_NAME,
    )
    .await
}

pub fn manifest_path(settings: &PublisherSettings) -> String {
    let folder = settings.default_folder.trim_matches('/');
    if folder.is_empty() {
        MANIFEST_NAME.to_string()
    } else {
        format!("{folder}/{MANIFEST_NAME}")
    }
}

/// Probe-then-write. The probe's not-found outcome is expected and swallowed;
/// the message is identical for create and update so the two payloads differ
/// only by the version token.
async fn upsert<H>(
    host: &H,
    attribution: &RepoAttribution,
    remote_path: &str,
    content_b64: String,
    title: &str,
) -> Result<(), PublishError>
where
    H: RepoHost + ?Sized,
{
    if attribution.owner.trim().is_empty() {
        return Err(PublishError::Config(
            "no repository owner configured; set `attribution.owner` in the settings".to_string(),
        ));
    }
    if attribution.repo.trim().is_empty() {
        return Err(PublishError::Config(
            "no repository name configured; set `attribution.repo` in the settings".to_string(),
        ));
    }

    let sha = match host.get_contents(attribution, remote_path).await {
        Ok(RemoteProbe::Found(obj)) if obj.object_type == "file" => Some(obj.sha),
        Ok(_) => None,
        Err(HostError::Cancelled) => return Err(PublishError::Host(HostError::Cancelled)),
        Err(e) => {
            debug!(remote = %remote_path, error = %e, "probe failed, treating as first publish");
            None
        }
    };

    let body = PutBody {
        message: format!("Update note {title}"),
        content: content_b64,
        sha,
        branch: Some(attribution.branch.clone()),
    };
    host.put_contents(attribution, remote_path, body)
        .await
        .map_err(PublishError::Host)
}

fn publish_summary(counters: &OutcomeCounters) -> String {
    if counters.is_empty() {
        return "No note published".to_string();
    }
    let mut msg = String::new();
    if counters.succeeded > 0 {
        msg.push_str(&format!("Successfully published {} note(s)", counters.succeeded));
    }
    if counters.failed > 0 {
        if !msg.is_empty() {
            msg.push_str(", ");
        }
        msg.push_str(&format!("failed to publish {} note(s)", counters.failed));
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_path_collapses_empty_folder() {
        let mut settings = PublisherSettings::default();
        assert_eq!(manifest_path(&settings), "docs/vault_published.json");
        settings.default_folder = String::new();
        assert_eq!(manifest_path(&settings), "vault_published.json");
    }

    #[test]
    fn summary_wording() {
        assert_eq!(publish_summary(&OutcomeCounters::default()), "No note published");
        let counters = OutcomeCounters {
            succeeded: 2,
            failed: 1,
        };
        let msg = publish_summary(&counters);
        assert!(msg.contains("2 note(s)"));
        assert!(msg.contains("failed to publish 1"));
    }
}
