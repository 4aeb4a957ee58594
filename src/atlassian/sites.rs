use crate::error::AppError;
use reqwest::Client;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::debug;

/// Per-tenant REST roots discovered for the current token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteUrls {
    pub jira_base: String,
    pub confluence_base: String,
}

#[derive(Debug, Deserialize)]
struct AccessibleResource {
    id: String,
    #[serde(default)]
    name: Option<String>,
}

/// Resolves the tenant-specific JIRA/Confluence REST base URLs by asking the
/// accessible-resources endpoint with the current bearer token. The first
/// returned cloud instance wins. The result is cached keyed by a fingerprint
/// of the token, so swapping tokens implicitly invalidates it.
pub struct SiteResolver {
    http: Client,
    resources_url: String,
    api_base_url: String,
    cached: RwLock<Option<(String, SiteUrls)>>,
}

impl SiteResolver {
    pub fn new(http: Client, resources_url: String, api_base_url: String) -> Self {
        Self {
            http,
            resources_url,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            cached: RwLock::new(None),
        }
    }

    pub async fn resolve(&self, access_token: &str) -> Result<SiteUrls, AppError> {
        let fingerprint = token_fingerprint(access_token);

        if let Some((cached_fp, urls)) = self.cached.read().await.as_ref() {
            if *cached_fp == fingerprint {
                return Ok(urls.clone());
            }
        }

        let response = self
            .http
            .get(&self.resources_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                "Atlassian site discovery failed",
                status.as_u16(),
                body,
            ));
        }

        let resources: Vec<AccessibleResource> = response.json().await.map_err(|e| {
            AppError::Internal(format!(
                "Atlassian site discovery failed: invalid upstream response: {}",
                e
            ))
        })?;

        let site = resources.first().ok_or_else(|| {
            AppError::upstream(
                "Atlassian site discovery failed",
                502,
                "no accessible Atlassian sites for this token",
            )
        })?;

        debug!(cloud_id = %site.id, site = ?site.name, "resolved Atlassian site");

        let urls = SiteUrls {
            jira_base: format!("{}/ex/jira/{}/rest/api/3", self.api_base_url, site.id),
            confluence_base: format!("{}/ex/confluence/{}/rest/api", self.api_base_url, site.id),
        };

        *self.cached.write().await = Some((fingerprint, urls.clone()));
        Ok(urls)
    }
}

fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    format!("{:x}", digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn resolver(mock: &MockServer) -> SiteResolver {
        SiteResolver::new(
            Client::new(),
            format!("{}/oauth/token/accessible-resources", mock.uri()),
            mock.uri(),
        )
    }

    #[tokio::test]
    async fn test_resolve_builds_product_bases() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .and(header("authorization", "Bearer token-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "cloud-1", "name": "Acme", "url": "https://acme.atlassian.net"},
                {"id": "cloud-2", "name": "Other", "url": "https://other.atlassian.net"}
            ])))
            .expect(1)
            .mount(&mock)
            .await;

        let resolver = resolver(&mock);
        let urls = resolver.resolve("token-abc").await.unwrap();

        assert_eq!(
            urls.jira_base,
            format!("{}/ex/jira/cloud-1/rest/api/3", mock.uri())
        );
        assert_eq!(
            urls.confluence_base,
            format!("{}/ex/confluence/cloud-1/rest/api", mock.uri())
        );

        // Second call with the same token hits the cache, not the mock
        // (expect(1) above would fail otherwise).
        let again = resolver.resolve("token-abc").await.unwrap();
        assert_eq!(again, urls);
    }

    #[tokio::test]
    async fn test_resolve_refetches_when_token_changes() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "cloud-1", "name": "Acme"}
            ])))
            .expect(2)
            .mount(&mock)
            .await;

        let resolver = resolver(&mock);
        resolver.resolve("token-one").await.unwrap();
        resolver.resolve("token-two").await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_empty_resource_list() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&mock)
            .await;

        let err = resolver(&mock).resolve("token-abc").await.unwrap_err();
        match err {
            AppError::Upstream { tag, .. } => {
                assert_eq!(tag, "Atlassian site discovery failed")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_upstream_error_forwards_status() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/token/accessible-resources"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .mount(&mock)
            .await;

        let err = resolver(&mock).resolve("token-abc").await.unwrap_err();
        match err {
            AppError::Upstream { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "expired");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        assert_eq!(token_fingerprint("a"), token_fingerprint("a"));
        assert_ne!(token_fingerprint("a"), token_fingerprint("b"));
    }
}
