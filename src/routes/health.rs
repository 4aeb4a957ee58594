use crate::server::Server;
use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

pub fn create_health_routes() -> Router<Server> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ready", get(ready))
}

/// Liveness probe.
async fn health(State(server): State<Server>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "env": server.config.app.env,
        "version": server.config.app.version,
        "dependencies_ok": true,
        "details": {"service": server.config.app.name},
    }))
}

/// Readiness probe. This gateway holds no persistent connections, so it is
/// ready as soon as it is serving.
async fn ready() -> Json<Value> {
    Json(json!({
        "ready": true,
        "reason": null,
        "dependencies_ok": true,
    }))
}

async fn root(State(server): State<Server>) -> Json<Value> {
    Json(json!({
        "message": server.config.app.name,
        "health": "/health",
        "ready": "/ready",
        "version": server.config.app.version,
    }))
}
