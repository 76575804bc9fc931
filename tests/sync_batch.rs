//! Sync runs against a mocked platform.

mod common;

use clickrank::activity_log::ActivityLog;
use clickrank::models::LogLevel;
use clickrank::SyncError;
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn app_for(server: &MockServer, dir: &tempfile::TempDir) -> clickrank::App {
    let settings = clickrank::config::Settings {
        api_base_url: format!("{}/api/v2/", server.uri()),
        ..common::settings(dir)
    };
    common::app_with(settings).await
}

async fn failures_logged(app: &clickrank::App) -> usize {
    app.log
        .recent(1000, Some(LogLevel::Warning))
        .await
        .unwrap()
        .iter()
        .filter(|e| e.message.starts_with("Sync item failed"))
        .count()
}

#[tokio::test]
async fn test_batch_with_one_unresolvable_item_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/sync"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "site_url": "https://example.com",
            "api_key": "secret",
            "post_count": 2
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "https://example.com/about/": {"page_title": "About us"},
            "https://example.com/does-not-exist/": {"page_title": "Ghost"},
            "https://example.com/hello/": {"meta_description": "Hello there"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let app = app_for(&server, &dir).await;
    let report = app.sync_orchestrator().unwrap().sync().await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.processed, 3);
    assert_eq!(report.successful, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page_url, "https://example.com/does-not-exist/");
    assert_eq!(failures_logged(&app).await, 1);

    let record = app.db.seo_data().get("https://example.com/about").await.unwrap().unwrap();
    assert_eq!(record.title.as_deref(), Some("About us"));
    assert!(app
        .db
        .seo_data()
        .get("https://example.com/does-not-exist")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_server_error_then_success_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/sync"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v2/sync"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let app = app_for(&server, &dir).await;
    let report = app.sync_orchestrator().unwrap().sync().await.unwrap();
    assert!(report.succeeded());
    assert_eq!(report.processed, 0);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/sync"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Unknown site"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let app = app_for(&server, &dir).await;
    let err = app.sync_orchestrator().unwrap().sync().await.unwrap_err();
    match err {
        SyncError::Remote { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Unknown site");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_connection_and_health_check_record_timestamps() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/subscription"))
        .and(body_partial_json(json!({
            "webhook_url": "https://example.com/clickrank-ai/v1/update-post"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let app = app_for(&server, &dir).await;
    let orchestrator = app.sync_orchestrator().unwrap();

    let status = orchestrator.test_connection().await;
    assert!(status.success);
    assert_eq!(status.message, "Connection successful");
    assert!(orchestrator.health_check().await);

    use clickrank::site::LegacyStore;
    assert!(app
        .site
        .get_option("clickrank_ai_last_health_check")
        .await
        .unwrap()
        .is_some());
    assert!(app
        .site
        .get_option("clickrank_ai_last_successful_connection")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_health_check_failure_is_not_escalated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v2/subscription"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let app = app_for(&server, &dir).await;
    let orchestrator = app.sync_orchestrator().unwrap();
    assert!(!orchestrator.health_check().await);

    let status = orchestrator.test_connection().await;
    assert!(!status.success);
    assert_eq!(status.message, "Connection failed - please verify your API key");
}
