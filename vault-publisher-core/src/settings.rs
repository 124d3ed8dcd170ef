//! Static configuration for a publisher instance.
//!
//! Loaded once (the CLI crate parses it from YAML) and passed by reference
//! through the pipeline. Nothing here is mutated at runtime.

use serde::{Deserialize, Serialize};

fn default_branch() -> String {
    "main".to_string()
}

/// Identity of one remote repository target. Compared by value: two
/// attributions are the same target iff owner, repo and branch all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoAttribution {
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for RepoAttribution {
    fn default() -> Self {
        RepoAttribution {
            owner: String::new(),
            repo: String::new(),
            branch: default_branch(),
        }
    }
}

impl std::fmt::Display for RepoAttribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.branch)
    }
}

/// How remote note paths are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// Everything lands under the default publish folder.
    Fixed,
    /// The note's frontmatter folder key picks the subfolder, under the
    /// configured root folder.
    Frontmatter,
}

/// The full settings bag consumed by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherSettings {
    /// Frontmatter field whose boolean value opts a note into publication.
    pub share_key: String,
    /// Comma-separated folder prefixes excluded from selection.
    pub excluded_folders: String,
    /// Default publish folder on the remote side.
    pub default_folder: String,
    /// Path placement mode for notes.
    pub placement: Placement,
    /// Root prefix used in frontmatter placement mode. Empty collapses to no
    /// prefix.
    pub root_folder: String,
    /// Frontmatter key holding the per-note target folder.
    pub folder_key: String,
    /// Remote folder for embedded attachments; falls back to `default_folder`
    /// when empty.
    pub image_folder: String,
    /// Whether embedded attachments are published alongside their note.
    pub transfer_embeds: bool,
    /// Exclusion rules applied during deletion reconciliation. Each rule is
    /// either a `/pattern/flags` delimited regex or a plain substring.
    pub exclusion_rules: Vec<String>,
    /// Workflow file name to dispatch after a publish batch. Empty disables
    /// the CI trigger.
    pub workflow_name: String,
    /// Default target repository for notes without a frontmatter override.
    pub attribution: RepoAttribution,
    /// Interval between workflow run polls.
    pub poll_interval_secs: u64,
    /// Upper bound on the workflow wait. `None` keeps the historical
    /// behaviour of waiting indefinitely.
    pub max_workflow_wait_secs: Option<u64>,
}

impl Default for PublisherSettings {
    fn default() -> Self {
        PublisherSettings {
            share_key: "share".to_string(),
            excluded_folders: String::new(),
            default_folder: "docs".to_string(),
            placement: Placement::Fixed,
            root_folder: String::new(),
            folder_key: "category".to_string(),
            image_folder: String::new(),
            transfer_embeds: true,
            exclusion_rules: Vec::new(),
            workflow_name: String::new(),
            attribution: RepoAttribution::default(),
            poll_interval_secs: 10,
            max_workflow_wait_secs: None,
        }
    }
}

impl PublisherSettings {
    /// The trimmed, non-empty entries of the excluded-folder list.
    pub fn excluded_folder_list(&self) -> Vec<&str> {
        self.excluded_folders
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribution_equality_is_by_value() {
        let a = RepoAttribution {
            owner: "me".into(),
            repo: "site".into(),
            branch: "main".into(),
        };
        let b = a.clone();
        let c = RepoAttribution {
            branch: "preview".into(),
            ..a.clone()
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn excluded_folder_list_trims_and_drops_empties() {
        let settings = PublisherSettings {
            excluded_folders: " private ,, templates,".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.excluded_folder_list(), vec!["private", "templates"]);
    }
}
