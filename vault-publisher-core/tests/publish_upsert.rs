use std::sync::{Arc, Mutex};

use vault_publisher_core::contract::{
    MockRepoHost, MockReporter, MockVault, NoteMeta, PutBody, RemoteObject, RemoteProbe,
};
use vault_publisher_core::publish::{publish_note, publish_vault, PublishError};
use vault_publisher_core::settings::{PublisherSettings, RepoAttribution};

fn configured_settings() -> PublisherSettings {
    PublisherSettings {
        attribution: RepoAttribution {
            owner: "me".to_string(),
            repo: "site".to_string(),
            branch: "main".to_string(),
        },
        transfer_embeds: false,
        ..Default::default()
    }
}

fn shared_note() -> NoteMeta {
    NoteMeta {
        path: "notes/guide.md".to_string(),
        name: "guide.md".to_string(),
        extension: "md".to_string(),
    }
}

fn vault_with_shared_note() -> MockVault {
    let mut vault = MockVault::new();
    vault.expect_frontmatter().returning(|_| {
        Some(
            serde_yaml::from_str("share: true\n").expect("frontmatter fixture should parse"),
        )
    });
    vault
        .expect_read_text()
        .returning(|_| Ok("# Guide\nbody\n".to_string()));
    vault
}

/// Publishing the same note twice: the first write carries no version token,
/// the second carries the token the probe returned, and the two payloads are
/// otherwise identical.
#[tokio::test]
async fn second_publish_differs_from_first_only_by_version_token() {
    let vault = vault_with_shared_note();
    let settings = configured_settings();
    let note = shared_note();

    let mut host = MockRepoHost::new();
    let mut seq = mockall::Sequence::new();
    host.expect_get_contents()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| Ok(RemoteProbe::NotFound));
    host.expect_get_contents()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_, _| {
            Ok(RemoteProbe::Found(RemoteObject {
                sha: "abc123".to_string(),
                object_type: "file".to_string(),
                content: None,
            }))
        });

    let bodies: Arc<Mutex<Vec<PutBody>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = bodies.clone();
    host.expect_put_contents()
        .times(2)
        .returning(move |_, _, body| {
            captured.lock().unwrap().push(body);
            Ok(())
        });

    let first = publish_note(&vault, &host, &settings, &note).await;
    assert!(matches!(first, Ok(true)), "first publish should succeed");
    let second = publish_note(&vault, &host, &settings, &note).await;
    assert!(matches!(second, Ok(true)), "second publish should succeed");

    let bodies = bodies.lock().unwrap();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0].sha, None, "create carries no version token");
    assert_eq!(
        bodies[1].sha.as_deref(),
        Some("abc123"),
        "update carries the probed token"
    );
    assert_eq!(bodies[0].message, bodies[1].message);
    assert_eq!(bodies[0].content, bodies[1].content);
    assert_eq!(bodies[0].branch, bodies[1].branch);
}

/// A probe failure that is not a cancellation is the expected first-publish
/// case, not an error: the write still goes out, without a token.
#[tokio::test]
async fn failed_probe_is_treated_as_first_publish() {
    let vault = vault_with_shared_note();
    let settings = configured_settings();

    let mut host = MockRepoHost::new();
    host.expect_get_contents().returning(|_, _| {
        Err(vault_publisher_core::contract::HostError::Transport(
            "connection reset".to_string(),
        ))
    });
    let bodies: Arc<Mutex<Vec<PutBody>>> = Arc::new(Mutex::new(Vec::new()));
    let captured = bodies.clone();
    host.expect_put_contents().returning(move |_, _, body| {
        captured.lock().unwrap().push(body);
        Ok(())
    });

    let result = publish_note(&vault, &host, &settings, &shared_note()).await;
    assert!(matches!(result, Ok(true)));
    assert_eq!(bodies.lock().unwrap()[0].sha, None);
}

/// An unshared note is skipped without touching the host.
#[tokio::test]
async fn unshared_note_is_not_published() {
    let mut vault = MockVault::new();
    vault.expect_frontmatter().returning(|_| None);
    let host = MockRepoHost::new();

    let result = publish_note(&vault, &host, &configured_settings(), &shared_note()).await;
    assert!(matches!(result, Ok(false)));
}

/// Missing repository identity is a configuration error that aborts the whole
/// batch before any per-file work happens.
#[tokio::test]
async fn missing_owner_aborts_whole_batch() {
    let mut vault = vault_with_shared_note();
    vault
        .expect_list_notes()
        .returning(|| Ok(vec![shared_note()]));

    let settings = PublisherSettings {
        attribution: RepoAttribution {
            owner: String::new(),
            repo: "site".to_string(),
            branch: "main".to_string(),
        },
        transfer_embeds: false,
        ..Default::default()
    };
    let host = MockRepoHost::new();
    let mut reporter = MockReporter::new();
    reporter
        .expect_notice()
        .withf(|msg: &str| msg.contains("owner"))
        .times(1)
        .return_const(());

    let result = publish_vault(&vault, &host, &reporter, &settings, false).await;
    match result {
        Err(PublishError::Config(msg)) => assert!(msg.contains("owner")),
        other => panic!("expected a configuration error, got {other:?}"),
    }
}

/// A cancelled write is neither counted nor reported, and the batch stops
/// without rewriting the manifest.
#[tokio::test]
async fn cancelled_write_is_not_counted_or_reported() {
    let mut vault = vault_with_shared_note();
    vault
        .expect_list_notes()
        .returning(|| Ok(vec![shared_note()]));

    let mut host = MockRepoHost::new();
    host.expect_get_contents()
        .returning(|_, _| Ok(RemoteProbe::NotFound));
    host.expect_put_contents()
        .times(1)
        .returning(|_, _, _| Err(vault_publisher_core::contract::HostError::Cancelled));

    // No notice expectation: reporting after cancellation must panic the mock.
    let reporter = MockReporter::new();
    let counters = publish_vault(&vault, &host, &reporter, &configured_settings(), false)
        .await
        .expect("cancellation is not an error outcome");
    assert!(counters.is_empty(), "cancelled writes are never counted");
}

/// A per-note write failure is counted and the batch continues with the next
/// note.
#[tokio::test]
async fn per_note_failure_does_not_stop_the_batch() {
    let mut vault = MockVault::new();
    let notes = vec![
        NoteMeta {
            path: "notes/a.md".to_string(),
            name: "a.md".to_string(),
            extension: "md".to_string(),
        },
        NoteMeta {
            path: "notes/b.md".to_string(),
            name: "b.md".to_string(),
            extension: "md".to_string(),
        },
    ];
    let listed = notes.clone();
    vault
        .expect_list_notes()
        .returning(move || Ok(listed.clone()));
    vault.expect_frontmatter().returning(|_| {
        Some(serde_yaml::from_str("share: true\n").expect("frontmatter fixture should parse"))
    });
    vault
        .expect_read_text()
        .returning(|path| Ok(format!("content of {path}")));

    let mut host = MockRepoHost::new();
    host.expect_get_contents()
        .returning(|_, _| Ok(RemoteProbe::NotFound));
    host.expect_put_contents().returning(|_, path, _| {
        if path.contains("a.md") {
            Err(vault_publisher_core::contract::HostError::Status {
                code: 422,
                message: "validation failed".to_string(),
            })
        } else {
            Ok(())
        }
    });

    let mut reporter = MockReporter::new();
    reporter
        .expect_notice()
        .withf(|msg: &str| msg.contains("1 note(s)"))
        .times(1)
        .return_const(());

    let settings = configured_settings();
    let counters = publish_vault(&vault, &host, &reporter, &settings, false)
        .await
        .expect("batch should not abort on a per-note failure");
    assert_eq!(counters.succeeded, 1);
    assert_eq!(counters.failed, 1);
}
