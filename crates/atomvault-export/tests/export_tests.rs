//! End-to-end export tests against a mock platform API
//!
//! Each test wires real folder records and component metadata through the
//! resolver and orchestrator, serving component XML from wiremock and
//! writing into a tempdir.

use std::sync::Arc;

use atomvault_api::AtomsphereClient;
use atomvault_core::retry::{RetryPolicy, RetryStrategy};
use atomvault_core::{ComponentRecord, Credentials, Error, FolderRecord};
use atomvault_export::{ExportOrchestrator, ExportOutcome, FolderResolver, RunSummary, UNASSIGNED_DIR};
use camino::Utf8PathBuf;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(server: &MockServer) -> Arc<AtomsphereClient> {
    let credentials = Credentials::new(
        Some("acct-1".to_string()),
        Some("jane@example.com".to_string()),
        Some("sekret".to_string()),
    )
    .unwrap();

    let client = AtomsphereClient::new(credentials)
        .unwrap()
        .with_base_url(server.uri())
        .with_retry_policy(RetryPolicy {
            max_attempts: 2,
            strategy: RetryStrategy::None,
            backoff_multiplier: 2.0,
            initial_delay_ms: 0,
            max_delay_ms: 0,
        });
    Arc::new(client)
}

fn component(id: &str, name: &str, version: &str, folder: Option<&str>) -> ComponentRecord {
    ComponentRecord {
        id: id.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        component_type: "process".to_string(),
        folder_id: folder.map(str::to_string),
    }
}

fn folder(id: &str, name: &str, parent: Option<&str>) -> FolderRecord {
    FolderRecord {
        id: id.to_string(),
        name: name.to_string(),
        parent_id: parent.map(str::to_string),
    }
}

async fn mock_component_xml(server: &MockServer, id: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/acct-1/Component/{}", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/xml")
                .set_body_string(body.to_string()),
        )
        .mount(server)
        .await;
}

fn temp_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

fn orchestrator(client: Arc<AtomsphereClient>, root: Utf8PathBuf) -> ExportOrchestrator {
    ExportOrchestrator::new(client, root)
        .with_concurrency(2)
        .with_progress(false)
}

#[tokio::test]
async fn writes_components_under_resolved_folder_paths() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component id=\"C1\"/>").await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    let mut resolver = FolderResolver::new(vec![
        folder("F1", "Sales", None),
        folder("F2", "EU", Some("F1")),
    ]);

    let outcomes = orchestrator(test_client(&server), root.clone())
        .run(
            vec![component("C1", "Invoice Process", "2", Some("F2"))],
            &mut resolver,
        )
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_written());

    let expected = root.join("Sales/EU/Invoice Process_v2_C1.xml");
    let bytes = std::fs::read(&expected).unwrap();
    assert_eq!(bytes, b"<Component id=\"C1\"/>");
}

#[tokio::test]
async fn folderless_components_land_in_the_unassigned_directory() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component/>").await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    let mut resolver = FolderResolver::new(vec![]);
    let outcomes = orchestrator(test_client(&server), root.clone())
        .run(vec![component("C1", "Orphan", "1", None)], &mut resolver)
        .await
        .unwrap();

    assert!(outcomes[0].is_written());
    assert!(root.join(UNASSIGNED_DIR).join("Orphan_v1_C1.xml").exists());
}

#[tokio::test]
async fn identical_display_names_never_collide() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component id=\"C1\"/>").await;
    mock_component_xml(&server, "C2", "<Component id=\"C2\"/>").await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    let mut resolver = FolderResolver::new(vec![folder("F1", "Sales", None)]);
    let outcomes = orchestrator(test_client(&server), root.clone())
        .run(
            vec![
                component("C1", "Sync", "2", Some("F1")),
                component("C2", "Sync", "2", Some("F1")),
            ],
            &mut resolver,
        )
        .await
        .unwrap();

    assert_eq!(outcomes.iter().filter(|o| o.is_written()).count(), 2);
    assert_eq!(
        std::fs::read(root.join("Sales/Sync_v2_C1.xml")).unwrap(),
        b"<Component id=\"C1\"/>"
    );
    assert_eq!(
        std::fs::read(root.join("Sales/Sync_v2_C2.xml")).unwrap(),
        b"<Component id=\"C2\"/>"
    );
}

#[tokio::test]
async fn one_failing_component_does_not_abort_the_run() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component id=\"C1\"/>").await;
    mock_component_xml(&server, "C3", "<Component id=\"C3\"/>").await;
    Mock::given(method("GET"))
        .and(path("/acct-1/Component/C2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    let mut resolver = FolderResolver::new(vec![]);
    let outcomes = orchestrator(test_client(&server), root.clone())
        .run(
            vec![
                component("C1", "One", "1", None),
                component("C2", "Two", "1", None),
                component("C3", "Three", "1", None),
            ],
            &mut resolver,
        )
        .await
        .unwrap();

    let summary = RunSummary::from_outcomes(&outcomes, resolver.anomaly_count());
    assert_eq!(summary.exported, 2);
    assert_eq!(summary.failed, 1);

    let failed = outcomes
        .iter()
        .find(|o| !o.is_written())
        .expect("one failure");
    assert_eq!(failed.component_id(), "C2");
    assert!(matches!(
        failed,
        ExportOutcome::Failed {
            error: Error::ItemFetch { .. },
            ..
        }
    ));

    // The failed component left nothing behind.
    assert!(root.join(UNASSIGNED_DIR).join("One_v1_C1.xml").exists());
    assert!(!root.join(UNASSIGNED_DIR).join("Two_v1_C2.xml").exists());
}

#[tokio::test]
async fn local_write_failure_is_recorded_without_aborting() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component id=\"C1\"/>").await;
    mock_component_xml(&server, "C2", "<Component id=\"C2\"/>").await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    // A regular file squats on C1's destination directory, so creating
    // the folder chain fails for that component only.
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("Sales"), b"not a directory").unwrap();

    let mut resolver = FolderResolver::new(vec![folder("F1", "Sales", None)]);
    let outcomes = orchestrator(test_client(&server), root.clone())
        .run(
            vec![
                component("C1", "Blocked", "1", Some("F1")),
                component("C2", "Fine", "1", None),
            ],
            &mut resolver,
        )
        .await
        .unwrap();

    let summary = RunSummary::from_outcomes(&outcomes, resolver.anomaly_count());
    assert_eq!(summary.exported, 1);
    assert_eq!(summary.failed, 1);

    let failed = outcomes
        .iter()
        .find(|o| !o.is_written())
        .expect("one failure");
    assert_eq!(failed.component_id(), "C1");
    assert!(matches!(
        failed,
        ExportOutcome::Failed {
            error: Error::Write { .. },
            ..
        }
    ));

    assert!(root.join(UNASSIGNED_DIR).join("Fine_v1_C2.xml").exists());
}

#[tokio::test]
async fn auth_rejection_mid_run_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/acct-1/Component/C1"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    let mut resolver = FolderResolver::new(vec![]);
    let err = orchestrator(test_client(&server), root)
        .run(vec![component("C1", "One", "1", None)], &mut resolver)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth { status: 403 }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn reruns_are_idempotent() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component id=\"C1\"/>").await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    let folders = vec![folder("F1", "Sales", None)];
    let components = vec![component("C1", "Invoice", "2", Some("F1"))];

    for _ in 0..2 {
        let mut resolver = FolderResolver::new(folders.clone());
        let outcomes = orchestrator(test_client(&server), root.clone())
            .run(components.clone(), &mut resolver)
            .await
            .unwrap();
        assert!(outcomes[0].is_written());
    }

    let entries: Vec<_> = std::fs::read_dir(root.join("Sales"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        std::fs::read(root.join("Sales/Invoice_v2_C1.xml")).unwrap(),
        b"<Component id=\"C1\"/>"
    );
}

#[tokio::test]
async fn anomalous_folder_chains_still_export() {
    let server = MockServer::start().await;
    mock_component_xml(&server, "C1", "<Component/>").await;

    let dir = tempfile::tempdir().unwrap();
    let root = temp_root(&dir);

    // EU's parent was deleted out from under the listing.
    let mut resolver = FolderResolver::new(vec![folder("F2", "EU", Some("F-gone"))]);
    let outcomes = orchestrator(test_client(&server), root.clone())
        .run(
            vec![component("C1", "Report", "1", Some("F2"))],
            &mut resolver,
        )
        .await
        .unwrap();

    assert!(outcomes[0].is_written());
    assert_eq!(resolver.anomaly_count(), 1);
    assert!(root.join("EU/Report_v1_C1.xml").exists());
}
