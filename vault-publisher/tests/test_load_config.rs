use serial_test::serial;
use std::fs::write;
use tempfile::NamedTempFile;

use vault_publisher_core::settings::Placement;

/// This test ensures a fully populated config file produces matching settings.
#[tokio::test]
#[serial]
async fn test_load_config_success_full_settings() {
    let config_yaml = r#"
share_key: publish
excluded_folders: "private, drafts"
default_folder: content/notes
placement: frontmatter
root_folder: site
folder_key: section
image_folder: content/images
transfer_embeds: false
exclusion_rules:
  - '/^legacy\//i'
  - scratch
workflow_name: deploy.yml
attribution:
  owner: example
  repo: digital-garden
  branch: gh-pages
poll_interval_secs: 5
max_workflow_wait_secs: 120
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let settings = vault_publisher::load_config::load_config(config_file.path())
        .expect("Config should load");

    assert_eq!(settings.share_key, "publish");
    assert_eq!(settings.excluded_folder_list(), vec!["private", "drafts"]);
    assert_eq!(settings.default_folder, "content/notes");
    assert_eq!(settings.placement, Placement::Frontmatter);
    assert_eq!(settings.root_folder, "site");
    assert_eq!(settings.folder_key, "section");
    assert_eq!(settings.image_folder, "content/images");
    assert!(!settings.transfer_embeds);
    assert_eq!(settings.exclusion_rules.len(), 2);
    assert_eq!(settings.workflow_name, "deploy.yml");
    assert_eq!(settings.attribution.owner, "example");
    assert_eq!(settings.attribution.repo, "digital-garden");
    assert_eq!(settings.attribution.branch, "gh-pages");
    assert_eq!(settings.poll_interval_secs, 5);
    assert_eq!(settings.max_workflow_wait_secs, Some(120));
}

/// This test ensures that omitted keys fall back to their documented defaults.
#[tokio::test]
#[serial]
async fn test_load_config_applies_defaults_for_missing_keys() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "attribution:\n  owner: example\n  repo: notes\n").unwrap();

    let settings = vault_publisher::load_config::load_config(config_file.path())
        .expect("Config with only attribution should load");

    assert_eq!(settings.share_key, "share");
    assert_eq!(settings.default_folder, "docs");
    assert_eq!(settings.placement, Placement::Fixed);
    assert!(settings.transfer_embeds);
    assert!(settings.exclusion_rules.is_empty());
    assert_eq!(settings.attribution.branch, "main");
    assert_eq!(settings.poll_interval_secs, 10);
    assert_eq!(settings.max_workflow_wait_secs, None);
}

/// This test ensures that if the config file is not valid YAML, load_config errors and reports as such.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_invalid_file() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), b"not-yaml: [:::").unwrap();

    let err = vault_publisher::load_config::load_config(config_file.path()).unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("parse") || msg.contains("YAML"),
        "Parse error expected, got: {msg}"
    );
}

/// This test ensures a missing config file reports the path in the error.
#[tokio::test]
#[serial]
async fn test_load_config_errors_for_missing_file() {
    let err = vault_publisher::load_config::load_config("/definitely/not/here.yaml").unwrap_err();
    let msg = err.to_string();
    assert!(
        msg.contains("read") || msg.contains("here.yaml"),
        "Read error expected, got: {msg}"
    );
}
