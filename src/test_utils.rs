use crate::{config::Config, server::Server};

/// Builder for test server instances with OAuth credentials preconfigured
/// and, optionally, every Atlassian endpoint pointed at a mock server.
pub struct TestServerBuilder {
    config: Config,
}

impl TestServerBuilder {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.oauth.client_id = "test-client-id".to_string();
        config.oauth.client_secret = "test-client-secret".to_string();
        config.oauth.redirect_uri =
            "http://localhost:8000/api/v1/auth/atlassian/callback".to_string();
        config.jwt.secret = "test-jwt-secret".to_string();
        Self { config }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Point the token endpoint, accessible-resources endpoint, and the
    /// per-tenant API root at a mock server base URL.
    pub fn with_atlassian_base(mut self, base: &str) -> Self {
        self.config.oauth.token_url = format!("{}/oauth/token", base);
        self.config.oauth.resources_url = format!("{}/oauth/token/accessible-resources", base);
        self.config.oauth.api_base_url = base.to_string();
        self
    }

    pub fn with_oauth_credentials(mut self, client_id: &str, redirect_uri: &str) -> Self {
        self.config.oauth.client_id = client_id.to_string();
        self.config.oauth.redirect_uri = redirect_uri.to_string();
        self
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn build(self) -> Server {
        Server::new(self.config).expect("failed to build test server")
    }
}

impl Default for TestServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
