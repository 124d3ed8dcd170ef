use vault_publisher_core::contract::{MockVault, NoteMeta};
use vault_publisher_core::select::{linked_images, select_shared};
use vault_publisher_core::settings::{PublisherSettings, RepoAttribution};

fn note(path: &str, extension: &str) -> NoteMeta {
    NoteMeta {
        path: path.to_string(),
        name: path.rsplit('/').next().unwrap().to_string(),
        extension: extension.to_string(),
    }
}

/// A note with absent or malformed frontmatter is excluded without failing
/// the pass, even when a sibling note is shared.
#[tokio::test]
async fn missing_metadata_excludes_without_crashing_selection() {
    let mut vault = MockVault::new();
    vault.expect_list_notes().returning(|| {
        Ok(vec![
            note("notes/shared.md", "md"),
            note("notes/bare.md", "md"),
            note("notes/broken.md", "md"),
        ])
    });
    vault.expect_frontmatter().returning(|path| match path {
        "notes/shared.md" => {
            Some(serde_yaml::from_str("share: true\n").expect("fixture should parse"))
        }
        // bare has no block at all, broken failed to parse; both are None.
        _ => None,
    });

    let settings = PublisherSettings {
        attribution: RepoAttribution {
            owner: "me".to_string(),
            repo: "site".to_string(),
            branch: "main".to_string(),
        },
        ..Default::default()
    };
    let decisions = select_shared(&vault, &settings)
        .await
        .expect("selection never fails on metadata");
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].note.path, "notes/shared.md");
    assert_eq!(decisions[0].remote_path, "docs/shared.md");
    assert_eq!(decisions[0].attribution, settings.attribution);
}

/// A frontmatter repo override routes the note to a different attribution
/// than the default.
#[tokio::test]
async fn repo_override_routes_to_another_attribution() {
    let mut vault = MockVault::new();
    vault.expect_list_notes().returning(|| {
        Ok(vec![note("notes/here.md", "md"), note("notes/there.md", "md")])
    });
    vault.expect_frontmatter().returning(|path| {
        let yaml = match path {
            "notes/there.md" => "share: true\nrepo: other/blog\n",
            _ => "share: true\n",
        };
        Some(serde_yaml::from_str(yaml).expect("fixture should parse"))
    });

    let settings = PublisherSettings {
        attribution: RepoAttribution {
            owner: "me".to_string(),
            repo: "site".to_string(),
            branch: "main".to_string(),
        },
        ..Default::default()
    };
    let decisions = select_shared(&vault, &settings).await.unwrap();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].attribution.owner, "me");
    assert_eq!(decisions[1].attribution.owner, "other");
    assert_eq!(decisions[1].attribution.repo, "blog");
}

/// Embed discovery keeps only allow-listed image types and skips embeds that
/// do not resolve, without failing the parent note.
#[tokio::test]
async fn embed_discovery_filters_and_skips_failures() {
    let mut vault = MockVault::new();
    vault.expect_embeds().returning(|_| {
        vec![
            "diagram.SVG".to_string(),
            "missing.png".to_string(),
            "report.pdf".to_string(),
        ]
    });
    vault
        .expect_resolve_embed()
        .returning(|link, _| match link {
            "diagram.SVG" => Some(note("assets/diagram.SVG", "SVG")),
            "report.pdf" => Some(note("assets/report.pdf", "pdf")),
            _ => None,
        });

    let images = linked_images(&vault, &note("notes/a.md", "md")).await;
    assert_eq!(images.len(), 1, "only the case-insensitive image match survives");
    assert_eq!(images[0].path, "assets/diagram.SVG");
}
