use crate::{
    auth::{StateStore, TokenCache, TokenRecord},
    config::OAuthConfig,
    error::AppError,
};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

const DEFAULT_TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Shape of a successful response from the Atlassian token endpoint, for
/// both the authorization-code and refresh-token grants.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    token_type: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

/// Orchestrates the Atlassian authorization-code flow: builds the redirect,
/// exchanges callback codes, refreshes expired tokens, and keeps the single
/// process-wide credential set current.
pub struct OAuthService {
    config: OAuthConfig,
    http: Client,
    pub states: Arc<StateStore>,
    pub tokens: Arc<TokenCache>,
}

impl OAuthService {
    pub fn new(
        config: OAuthConfig,
        http: Client,
        states: Arc<StateStore>,
        tokens: Arc<TokenCache>,
    ) -> Self {
        Self {
            config,
            http,
            states,
            tokens,
        }
    }

    fn require_configured(&self) -> Result<(), AppError> {
        if self.config.client_id.is_empty() {
            return Err(AppError::Configuration(
                "ATLASSIAN_CLIENT_ID is not configured".to_string(),
            ));
        }
        if self.config.redirect_uri.is_empty() {
            return Err(AppError::Configuration(
                "ATLASSIAN_REDIRECT_URI is not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the authorization URL with a freshly issued CSRF state token.
    /// Returns the URL and the state value it carries.
    pub async fn authorization_url(&self) -> Result<(String, String), AppError> {
        self.require_configured()?;

        let state = self.states.create().await;

        let mut url = Url::parse(&self.config.authorization_url).map_err(|e| {
            AppError::Configuration(format!("Invalid authorization URL: {}", e))
        })?;
        url.query_pairs_mut()
            .append_pair("audience", "api.atlassian.com")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", &self.config.scopes.join(" "))
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", &state)
            .append_pair("response_type", "code")
            .append_pair("prompt", "consent");

        debug!(state = %state, "issued OAuth state token");
        Ok((url.to_string(), state))
    }

    /// Exchanges an authorization code for tokens and caches the result.
    /// Non-success upstream statuses are surfaced with their original body;
    /// transport failures map to an upstream-unavailable error.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord, AppError> {
        self.require_configured()?;

        let payload = json!({
            "grant_type": "authorization_code",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "code": code,
            "redirect_uri": self.config.redirect_uri,
        });

        let record = self
            .request_token(&payload, "Atlassian token exchange failed")
            .await?;
        self.tokens.set(record.clone()).await;
        info!("Atlassian token obtained via authorization code");
        Ok(record)
    }

    /// Returns a live access token, refreshing the cached record first when
    /// it has expired. Fails with an authentication-required error when no
    /// token is cached or no refresh is possible.
    pub async fn ensure_valid(&self) -> Result<String, AppError> {
        let record = self.tokens.get().await.ok_or_else(|| {
            AppError::AuthenticationRequired(
                "no Atlassian token cached; complete the login flow first".to_string(),
            )
        })?;

        if !record.is_expired() {
            return Ok(record.access_token);
        }

        let refresh_token = record.refresh_token.ok_or_else(|| {
            AppError::AuthenticationRequired(
                "cached Atlassian token expired and no refresh token is available".to_string(),
            )
        })?;

        let payload = json!({
            "grant_type": "refresh_token",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "refresh_token": refresh_token,
        });

        let refreshed = self
            .request_token(&payload, "Atlassian token refresh failed")
            .await?;
        self.tokens.set(refreshed.clone()).await;
        info!("Atlassian token refreshed");
        Ok(refreshed.access_token)
    }

    async fn request_token(
        &self,
        payload: &serde_json::Value,
        tag: &str,
    ) -> Result<TokenRecord, AppError> {
        let response = self
            .http
            .post(&self.config.token_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(tag, status.as_u16(), body));
        }

        let token: TokenEndpointResponse = response.json().await.map_err(|e| {
            AppError::Internal(format!("{}: invalid token endpoint response: {}", tag, e))
        })?;

        let lifetime = token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS);
        Ok(TokenRecord {
            access_token: token.access_token,
            token_type: token.token_type,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
            scope: token.scope,
        })
    }
}
