/// `load_config` module: loads the static YAML settings file into the
/// strongly-typed [`PublisherSettings`] consumed by the core pipeline.
///
/// This module is the only place where untrusted YAML is parsed. Secrets are
/// never part of the file: the GitHub token comes from the environment (see
/// [`crate::github::GithubClient::new_from_env`]).
///
/// # Errors
/// All errors here use `anyhow::Error` for context-rich diagnostics and are
/// surfaced at the CLI boundary.
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};
use vault_publisher_core::settings::PublisherSettings;

/// Loads a static YAML settings file. Missing keys fall back to their
/// defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PublisherSettings> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let settings: PublisherSettings = match serde_yaml::from_str(&config_content) {
        Ok(settings) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            settings
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    Ok(settings)
}
