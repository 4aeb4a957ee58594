use crate::server::Server;
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

/// Connectivity checks reporting whether static base URLs were configured.
/// Authenticated traffic does not use these; it goes through site discovery.
pub fn create_integration_routes() -> Router<Server> {
    Router::new()
        .route("/jira/ping", get(jira_ping))
        .route("/confluence/ping", get(confluence_ping))
}

async fn jira_ping(State(server): State<Server>) -> Json<Value> {
    let base = &server.config.jira.base_url;
    Json(json!({
        "service": "jira",
        "configured": !base.is_empty(),
        "base_url": if base.is_empty() { Value::Null } else { json!(base) },
    }))
}

async fn confluence_ping(State(server): State<Server>) -> Json<Value> {
    let base = &server.config.confluence.base_url;
    Json(json!({
        "service": "confluence",
        "configured": !base.is_empty(),
        "base_url": if base.is_empty() { Value::Null } else { json!(base) },
    }))
}
