/// This module implements the full CLI interface for vault-publisher —
/// command parsing, argument validation and the async entrypoint.
///
/// All core business logic (selection, publishing, reconciliation) lives in
/// the `vault-publisher-core` crate. This module is strictly CLI glue and
/// orchestration.
///
/// ## How To Use
/// - For command-line users: use the installed `vault-publisher` binary with
///   `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed
///   [`Cli`].
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use vault_publisher_core::contract::Vault;
use vault_publisher_core::{prune, publish, workflow};

use crate::github::{GithubClient, StdoutReporter};
use crate::load_config::load_config;
use crate::vault::FsVault;

/// CLI for vault-publisher: mirror shared vault notes into GitHub repositories.
#[derive(Parser)]
#[clap(
    name = "vault-publisher",
    version,
    about = "Publish shared vault notes to GitHub repositories and prune what is no longer shared"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Publish the whole vault (or one note) to the configured repositories
    Publish {
        /// Path to the YAML settings file
        #[clap(long)]
        config: PathBuf,
        /// Root directory of the local vault
        #[clap(long)]
        vault: PathBuf,
        /// Publish only this note (vault-relative path)
        #[clap(long)]
        note: Option<String>,
    },
    /// Delete remote files no longer shared by the local vault
    Prune {
        /// Path to the YAML settings file
        #[clap(long)]
        config: PathBuf,
        /// Root directory of the local vault
        #[clap(long)]
        vault: PathBuf,
        /// Suppress the summary notice
        #[clap(long)]
        silent: bool,
    },
    /// Trigger the configured CI workflow and wait for it to finish
    Ci {
        /// Path to the YAML settings file
        #[clap(long)]
        config: PathBuf,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Publish {
            config,
            vault,
            note,
        } => {
            let settings = load_config(config)?;
            let host = GithubClient::new_from_env()
                .map_err(|e| anyhow::Error::msg(format!("GitHub client setup failed: {e}")))?;
            let fs_vault = FsVault::new(vault);
            let reporter = StdoutReporter;
            let cancel = CancellationToken::new();

            match note {
                Some(note_path) => {
                    tracing::info!(command = "publish", note = %note_path, "Publishing single note");
                    let notes = fs_vault
                        .list_notes()
                        .await
                        .map_err(|e| anyhow::Error::msg(format!("Vault walk failed: {e}")))?;
                    let Some(meta) = notes.into_iter().find(|n| n.path == note_path) else {
                        anyhow::bail!("note not found in vault: {note_path}");
                    };
                    let published =
                        publish::publish_note(&fs_vault, &host, &settings, &meta)
                            .await
                            .map_err(|e| anyhow::Error::msg(format!("Publish failed: {e:?}")))?;
                    if published {
                        reporter_line(&format!("Published {note_path}"));
                    } else {
                        reporter_line(&format!("{note_path} is not shared, nothing sent"));
                    }
                }
                None => {
                    tracing::info!(command = "publish", "Starting whole-vault publish");
                    let counters =
                        publish::publish_vault(&fs_vault, &host, &reporter, &settings, false)
                            .await
                            .map_err(|e| anyhow::Error::msg(format!("Publish failed: {e:?}")))?;
                    tracing::info!(?counters, "Publish batch complete");
                }
            }

            match workflow::trigger_and_wait(&host, &settings, &cancel).await {
                Ok(()) => Ok(()),
                Err(workflow::WorkflowError::Cancelled) => Ok(()),
                Err(e) => Err(anyhow::Error::msg(format!("Workflow wait failed: {e:?}"))),
            }
        }
        Commands::Prune {
            config,
            vault,
            silent,
        } => {
            let settings = load_config(config)?;
            let host = GithubClient::new_from_env()
                .map_err(|e| anyhow::Error::msg(format!("GitHub client setup failed: {e}")))?;
            let fs_vault = FsVault::new(vault);
            let reporter = StdoutReporter;
            let cancel = CancellationToken::new();

            tracing::info!(command = "prune", "Starting deletion reconciliation");
            let outcomes = prune::reconcile_all(
                &fs_vault, &host, &reporter, &settings, silent, &cancel,
            )
            .await
            .map_err(|e| anyhow::Error::msg(format!("Prune failed: {e:?}")))?;
            tracing::info!(passes = outcomes.len(), "Reconciliation complete");
            Ok(())
        }
        Commands::Ci { config } => {
            let settings = load_config(config)?;
            let host = GithubClient::new_from_env()
                .map_err(|e| anyhow::Error::msg(format!("GitHub client setup failed: {e}")))?;
            let cancel = CancellationToken::new();
            match workflow::trigger_and_wait(&host, &settings, &cancel).await {
                Ok(()) => Ok(()),
                Err(workflow::WorkflowError::Cancelled) => Ok(()),
                Err(e) => Err(anyhow::Error::msg(format!("Workflow wait failed: {e:?}"))),
            }
        }
    }
}

fn reporter_line(message: &str) {
    println!("{message}");
}
