use crate::{
    atlassian::{ConfluenceService, JiraService, SiteResolver},
    auth::{jwt::JwtService, OAuthService, StateStore, TokenCache},
    config::Config,
    error::AppError,
    routes::{
        create_auth_routes, create_confluence_routes, create_health_routes,
        create_integration_routes, create_jira_routes, create_user_routes,
    },
    users::UserStore,
};
use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub oauth: Arc<OAuthService>,
    pub sites: Arc<SiteResolver>,
    pub jira: Arc<JiraService>,
    pub confluence: Arc<ConfluenceService>,
    pub users: Arc<UserStore>,
    pub jwt: Arc<JwtService>,
}

impl Server {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let states = Arc::new(StateStore::new());
        let tokens = Arc::new(TokenCache::new());

        let oauth = Arc::new(OAuthService::new(
            config.oauth.clone(),
            http.clone(),
            states,
            tokens,
        ));
        let sites = Arc::new(SiteResolver::new(
            http.clone(),
            config.oauth.resources_url.clone(),
            config.oauth.api_base_url.clone(),
        ));
        let jira = Arc::new(JiraService::new(http.clone(), oauth.clone(), sites.clone()));
        let confluence = Arc::new(ConfluenceService::new(http, oauth.clone(), sites.clone()));

        let users = Arc::new(UserStore::new());
        let jwt = Arc::new(JwtService::new(config.jwt.secret.clone()));

        Ok(Self {
            config: Arc::new(config),
            oauth,
            sites,
            jira,
            confluence,
            users,
            jwt,
        })
    }

    pub async fn run(&self) -> Result<(), AppError> {
        let app = self.create_app();

        let listener = TcpListener::bind((self.config.server.host.as_str(), self.config.server.port))
            .await
            .map_err(|e| AppError::Internal(format!("Failed to bind to address: {}", e)))?;

        let addr = listener
            .local_addr()
            .map_err(|e| AppError::Internal(format!("Failed to read local address: {}", e)))?;
        info!("Server listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

        info!("Server shutdown complete");
        Ok(())
    }

    // Kept separate from run() so tests can drive the router in-process.
    pub fn create_app(&self) -> Router {
        Router::new()
            .merge(create_health_routes())
            .nest("/api/v1/auth", create_auth_routes())
            .nest("/api/v1/jira", create_jira_routes())
            .nest("/api/v1/confluence", create_confluence_routes())
            .nest("/api/v1/users", create_user_routes())
            .nest("/api/v1/integrations", create_integration_routes())
            .layer(self.cors_layer())
            .with_state(self.clone())
    }

    /// Wildcard (or unset) origins allow anything without credentials;
    /// an explicit origin list enables credentialed requests.
    fn cors_layer(&self) -> CorsLayer {
        if self.config.cors_allow_any() {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }

        let origins: Vec<HeaderValue> = self
            .config
            .cors
            .origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            .allow_credentials(true)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
