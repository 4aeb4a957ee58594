mod common;

use atlassian_gateway::test_utils::TestServerBuilder;
use axum::http::StatusCode;
use common::{body_json, TestHarness};

#[tokio::test]
async fn test_health_reports_env_and_version() {
    let harness = TestHarness::new();

    let response = harness.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["env"], "development");
    assert_eq!(body["dependencies_ok"], true);
    assert!(body["version"].as_str().is_some());
}

#[tokio::test]
async fn test_ready() {
    let harness = TestHarness::new();

    let response = harness.get("/ready").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ready"], true);
    assert_eq!(body["reason"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_root_lists_probe_endpoints() {
    let harness = TestHarness::new();

    let response = harness.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["health"], "/health");
    assert_eq!(body["ready"], "/ready");
}

#[tokio::test]
async fn test_ping_endpoints_report_unconfigured_by_default() {
    let harness = TestHarness::new();

    let response = harness.get("/api/v1/integrations/jira/ping").await;
    let body = body_json(response).await;
    assert_eq!(body["service"], "jira");
    assert_eq!(body["configured"], false);
    assert_eq!(body["base_url"], serde_json::Value::Null);

    let response = harness.get("/api/v1/integrations/confluence/ping").await;
    let body = body_json(response).await;
    assert_eq!(body["service"], "confluence");
    assert_eq!(body["configured"], false);
}

#[tokio::test]
async fn test_ping_endpoints_report_configured_base_urls() {
    let mut builder = TestServerBuilder::new();
    builder.config_mut().jira.base_url = "https://acme.atlassian.net".to_string();
    builder.config_mut().confluence.base_url = "https://acme.atlassian.net/wiki".to_string();
    let harness = TestHarness::from_builder(builder);

    let response = harness.get("/api/v1/integrations/jira/ping").await;
    let body = body_json(response).await;
    assert_eq!(body["configured"], true);
    assert_eq!(body["base_url"], "https://acme.atlassian.net");

    let response = harness.get("/api/v1/integrations/confluence/ping").await;
    let body = body_json(response).await;
    assert_eq!(body["configured"], true);
}
