//! Integration test: share request flow against recording collaborators.
//!
//! The workspace and feeds services are replaced by in-process fakes that
//! record every call, so the tests can check both what was sent and what was
//! never sent.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use narrative_core::config::NarrativeConfig;
use narrative_core::error::{Error, Result, ValidationError};
use narrative_core::feeds::NotificationPublisher;
use narrative_core::model::notification::Notification;
use narrative_core::model::share::{
    DUPLICATE_REQUEST, MISSING_AUTHORIZATION, ShareLevel, ShareRequestParams, ShareResult,
};
use narrative_core::sharing::{NarrativeEngine, ShareRequester};
use narrative_core::storage::ShareRequestStore;
use narrative_core::storage::memory::InMemoryShareRequestStore;
use narrative_core::workspace::WorkspaceAdminLookup;

#[derive(Default)]
struct FakeWorkspace {
    admins: Vec<String>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(i64, String, String)>>,
}

impl FakeWorkspace {
    fn with_admins(admins: &[&str]) -> Self {
        Self {
            admins: admins.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn slow(admins: &[&str], delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_admins(admins)
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl WorkspaceAdminLookup for FakeWorkspace {
    async fn get_ws_admins(
        &self,
        ws_id: i64,
        workspace_url: &str,
        token: &str,
    ) -> Result<Vec<String>> {
        self.calls
            .lock()
            .unwrap()
            .push((ws_id, workspace_url.to_string(), token.to_string()));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(message) => Err(Error::Workspace(message.clone())),
            None => Ok(self.admins.clone()),
        }
    }
}

#[derive(Default)]
struct FakeFeeds {
    fail_with: Option<String>,
    sent: Mutex<Vec<(Notification, String, String)>>,
}

impl FakeFeeds {
    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn sent(&self) -> Vec<(Notification, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl NotificationPublisher for FakeFeeds {
    async fn create_notification(
        &self,
        note: &Notification,
        feeds_url: &str,
        token: &str,
    ) -> Result<String> {
        self.sent
            .lock()
            .unwrap()
            .push((note.clone(), feeds_url.to_string(), token.to_string()));
        match &self.fail_with {
            Some(message) => Err(Error::Feeds(message.clone())),
            None => Ok("note-1".to_string()),
        }
    }
}

fn full_config() -> NarrativeConfig {
    NarrativeConfig {
        service_token: Some("service-token-value".to_string()),
        ws_admin_token: Some("ws-admin-token-value".to_string()),
        workspace_url: Some("https://kbase.example/services/ws".to_string()),
        feeds_url: Some("https://kbase.example/services/feeds".to_string()),
        ..Default::default()
    }
}

fn engine(
    config: NarrativeConfig,
    workspace: &Arc<FakeWorkspace>,
    feeds: &Arc<FakeFeeds>,
) -> NarrativeEngine {
    NarrativeEngine::new(config, workspace.clone(), feeds.clone())
}

#[test]
fn test_missing_fields_are_named() {
    let config = Arc::new(full_config());
    let cases = [
        (ShareRequestParams { ws_id: None, ..ShareRequestParams::new(1, "carol", "r") }, "ws_id"),
        (ShareRequestParams { user: None, ..ShareRequestParams::new(1, "carol", "r") }, "user"),
        (
            ShareRequestParams { share_level: None, ..ShareRequestParams::new(1, "carol", "r") },
            "share_level",
        ),
    ];

    for (params, field) in cases {
        let err = ShareRequester::new(params, config.clone()).unwrap_err();
        match err {
            Error::Validation(ValidationError::MissingField(name)) => assert_eq!(name, field),
            other => panic!("expected missing field {field}, got {other:?}"),
        }
    }
}

#[test]
fn test_null_fields_from_json_are_missing() {
    let params: ShareRequestParams =
        serde_json::from_value(serde_json::json!({"ws_id": null, "user": "carol", "share_level": "r"}))
            .unwrap();
    let err = ShareRequester::new(params, Arc::new(full_config())).unwrap_err();
    assert_eq!(err.to_string(), "Missing required parameter \"ws_id\"");
}

#[tokio::test]
async fn test_invalid_share_level_is_rejected_before_any_call() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::default());
    let engine = engine(full_config(), &workspace, &feeds);

    for bad in ["n", "x", "admin", ""] {
        let err = engine
            .request_share(ShareRequestParams::new(10, "carol", bad))
            .await
            .unwrap_err();
        match err {
            Error::Validation(ValidationError::InvalidShareLevel(value)) => assert_eq!(value, bad),
            other => panic!("expected invalid share level, got {other:?}"),
        }
    }
    assert_eq!(workspace.call_count(), 0);
    assert!(feeds.sent().is_empty());
}

#[tokio::test]
async fn test_missing_service_token_is_soft_failure() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::default());
    let config = NarrativeConfig {
        service_token: None,
        ..full_config()
    };
    let engine = engine(config, &workspace, &feeds);

    let result = engine
        .request_share(ShareRequestParams::new(10, "carol", "r"))
        .await
        .unwrap();

    assert_eq!(result, ShareResult::failure(MISSING_AUTHORIZATION));
    assert_eq!(
        result.error.as_deref(),
        Some("Unable to request share - NarrativeService is missing authorization.")
    );
    assert_eq!(workspace.call_count(), 0);
    assert!(feeds.sent().is_empty());
}

#[tokio::test]
async fn test_missing_service_token_wins_over_other_missing_keys() {
    let workspace = Arc::new(FakeWorkspace::default());
    let feeds = Arc::new(FakeFeeds::default());
    let engine = engine(NarrativeConfig::default(), &workspace, &feeds);

    let result = engine
        .request_share(ShareRequestParams::new(10, "carol", "r"))
        .await
        .unwrap();
    assert_eq!(result.ok, 0);
}

#[tokio::test]
async fn test_recipients_are_admins_then_requester() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice", "bob"]));
    let feeds = Arc::new(FakeFeeds::default());
    let engine = engine(full_config(), &workspace, &feeds);

    let result = engine
        .request_share(ShareRequestParams::new(42, "carol", "w"))
        .await
        .unwrap();
    assert_eq!(result, ShareResult::success());

    let calls = workspace.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![(
            42,
            "https://kbase.example/services/ws".to_string(),
            "ws-admin-token-value".to_string()
        )]
    );

    let sent = feeds.sent();
    assert_eq!(sent.len(), 1);
    let (note, feeds_url, token) = &sent[0];
    assert_eq!(note.recipient_ids(), vec!["alice", "bob", "carol"]);
    assert_eq!(note.actor.id, "carol");
    assert_eq!(note.verb, "request");
    assert_eq!(note.object.id, 42);
    assert_eq!(note.context.level, ShareLevel::Write);
    assert_eq!(feeds_url, "https://kbase.example/services/feeds");
    assert_eq!(token, "service-token-value");
}

#[tokio::test]
async fn test_requester_already_admin_is_not_deduplicated() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["carol"]));
    let feeds = Arc::new(FakeFeeds::default());
    let engine = engine(full_config(), &workspace, &feeds);

    let result = engine
        .request_share(ShareRequestParams::new(7, "carol", "a"))
        .await
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(feeds.sent()[0].0.recipient_ids(), vec!["carol", "carol"]);
}

#[tokio::test]
async fn test_admin_lookup_failure_propagates_without_notification() {
    let workspace = Arc::new(FakeWorkspace::failing("workspace 7 is deleted"));
    let feeds = Arc::new(FakeFeeds::default());
    let engine = engine(full_config(), &workspace, &feeds);

    let err = engine
        .request_share(ShareRequestParams::new(7, "carol", "r"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Workspace(ref m) if m == "workspace 7 is deleted"));
    assert!(feeds.sent().is_empty());
}

#[tokio::test]
async fn test_notification_failure_propagates() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::failing("feeds unavailable"));
    let engine = engine(full_config(), &workspace, &feeds);

    let err = engine
        .request_share(ShareRequestParams::new(7, "carol", "r"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Feeds(ref m) if m == "feeds unavailable"));
    assert_eq!(feeds.sent().len(), 1);
}

#[tokio::test]
async fn test_missing_workspace_url_is_config_error() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::default());
    let config = NarrativeConfig {
        workspace_url: None,
        ..full_config()
    };
    let engine = engine(config, &workspace, &feeds);

    let err = engine
        .request_share(ShareRequestParams::new(7, "carol", "r"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(ref m) if m.contains("workspace-url")));
    assert_eq!(workspace.call_count(), 0);
    assert!(feeds.sent().is_empty());
}

#[tokio::test]
async fn test_requests_are_independent_by_default() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::default());
    let engine = engine(full_config(), &workspace, &feeds);

    for _ in 0..2 {
        let result = engine
            .request_share(ShareRequestParams::new(7, "carol", "r"))
            .await
            .unwrap();
        assert!(result.is_ok());
    }
    assert_eq!(feeds.sent().len(), 2);
}

#[tokio::test]
async fn test_share_store_suppresses_duplicate_requests() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::default());
    let store = Arc::new(InMemoryShareRequestStore::new(16));
    let engine = engine(full_config(), &workspace, &feeds).with_share_store(store.clone());

    let first = engine
        .request_share(ShareRequestParams::new(7, "carol", "r"))
        .await
        .unwrap();
    assert!(first.is_ok());

    let record = store
        .find(7, "carol", ShareLevel::Read)
        .await
        .unwrap()
        .expect("request should be recorded");
    assert_eq!(record.notification_id, "note-1");

    let second = engine
        .request_share(ShareRequestParams::new(7, "carol", "r"))
        .await
        .unwrap();
    assert_eq!(second, ShareResult::failure(DUPLICATE_REQUEST));
    assert_eq!(workspace.call_count(), 1);
    assert_eq!(feeds.sent().len(), 1);

    // A different level is a different request
    let other_level = engine
        .request_share(ShareRequestParams::new(7, "carol", "w"))
        .await
        .unwrap();
    assert!(other_level.is_ok());
    assert_eq!(feeds.sent().len(), 2);
}

#[tokio::test]
async fn test_failed_notification_is_not_recorded() {
    let workspace = Arc::new(FakeWorkspace::with_admins(&["alice"]));
    let feeds = Arc::new(FakeFeeds::failing("feeds unavailable"));
    let store = Arc::new(InMemoryShareRequestStore::new(16));
    let engine = engine(full_config(), &workspace, &feeds).with_share_store(store.clone());

    assert!(
        engine
            .request_share(ShareRequestParams::new(7, "carol", "r"))
            .await
            .is_err()
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_failed_admin_lookup_releases_request() {
    let workspace = Arc::new(FakeWorkspace::failing("workspace 7 is deleted"));
    let feeds = Arc::new(FakeFeeds::default());
    let store = Arc::new(InMemoryShareRequestStore::new(16));
    let engine = engine(full_config(), &workspace, &feeds).with_share_store(store.clone());

    for _ in 0..2 {
        let err = engine
            .request_share(ShareRequestParams::new(7, "carol", "r"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Workspace(_)));
    }
    // Both attempts reached the workspace: the first one did not hold the key
    assert_eq!(workspace.call_count(), 2);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_concurrent_duplicate_requests_send_one_notification() {
    let workspace = Arc::new(FakeWorkspace::slow(&["alice"], Duration::from_millis(50)));
    let feeds = Arc::new(FakeFeeds::default());
    let store = Arc::new(InMemoryShareRequestStore::new(16));
    let engine = engine(full_config(), &workspace, &feeds).with_share_store(store.clone());

    let (a, b) = tokio::join!(
        engine.request_share(ShareRequestParams::new(7, "carol", "r")),
        engine.request_share(ShareRequestParams::new(7, "carol", "r")),
    );
    let mut results = vec![a.unwrap(), b.unwrap()];
    results.sort_by_key(|r| r.ok);

    assert_eq!(
        results,
        vec![ShareResult::failure(DUPLICATE_REQUEST), ShareResult::success()]
    );
    assert_eq!(workspace.call_count(), 1);
    assert_eq!(feeds.sent().len(), 1);

    let record = store.find(7, "carol", ShareLevel::Read).await.unwrap();
    assert_eq!(record.map(|r| r.notification_id).as_deref(), Some("note-1"));
}
