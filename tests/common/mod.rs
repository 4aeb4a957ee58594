#![allow(dead_code)]

use atlassian_gateway::{auth::TokenRecord, test_utils::TestServerBuilder, Server};
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use tower::ServiceExt;

/// Test harness holding a server plus its router, with helpers for driving
/// requests in-process.
pub struct TestHarness {
    pub server: Server,
    pub app: Router,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::from_builder(TestServerBuilder::new())
    }

    /// Harness with every Atlassian endpoint pointed at a mock server.
    pub fn with_atlassian_base(base: &str) -> Self {
        Self::from_builder(TestServerBuilder::new().with_atlassian_base(base))
    }

    pub fn from_builder(builder: TestServerBuilder) -> Self {
        let server = builder.build();
        let app = server.create_app();
        Self { server, app }
    }

    /// Seed a live Atlassian token so proxy calls pass the auth check.
    pub async fn seed_token(&self, access_token: &str) {
        self.server
            .oauth
            .tokens
            .set(TokenRecord {
                access_token: access_token.to_string(),
                token_type: "Bearer".to_string(),
                refresh_token: Some("seeded-refresh".to_string()),
                expires_at: Utc::now() + chrono::Duration::seconds(3600),
                scope: Some("read:jira-work".to_string()),
            })
            .await;
    }

    /// Seed an already-expired token carrying a refresh token.
    pub async fn seed_expired_token(&self, access_token: &str, refresh_token: Option<&str>) {
        self.server
            .oauth
            .tokens
            .set(TokenRecord {
                access_token: access_token.to_string(),
                token_type: "Bearer".to_string(),
                refresh_token: refresh_token.map(str::to_string),
                expires_at: Utc::now() - chrono::Duration::seconds(10),
                scope: None,
            })
            .await;
    }

    pub async fn request(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .method(Method::GET)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.request(
            Request::builder()
                .method(Method::DELETE)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.json_request(Method::POST, uri, body).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> Response {
        self.json_request(Method::PUT, uri, body).await
    }

    async fn json_request(
        &self,
        method: Method,
        uri: &str,
        body: serde_json::Value,
    ) -> Response {
        self.request(
            Request::builder()
                .method(method)
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
