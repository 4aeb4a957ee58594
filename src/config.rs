use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    pub oauth: OAuthConfig,
    pub jira: IntegrationConfig,
    pub confluence: IntegrationConfig,
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub env: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Explicit allowed origins. Empty (or a single `*`) allows any origin
    /// without credentials. `config` drops empty arrays when serializing the
    /// defaults source, so a missing key must deserialize back to the empty
    /// default rather than erroring.
    #[serde(default)]
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub authorization_url: String,
    pub token_url: String,
    /// Accessible-resources endpoint used for tenant (site) discovery.
    pub resources_url: String,
    /// Root under which per-tenant JIRA/Confluence REST bases live.
    pub api_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub token_ttl_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            app: AppConfig {
                name: "atlassian-gateway".to_string(),
                env: "development".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            cors: CorsConfig { origins: vec![] },
            oauth: OAuthConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
                scopes: vec![
                    "read:jira-work".to_string(),
                    "write:jira-work".to_string(),
                    "read:confluence-content.all".to_string(),
                    "write:confluence-content".to_string(),
                    "offline_access".to_string(),
                ],
                authorization_url: "https://auth.atlassian.com/authorize".to_string(),
                token_url: "https://auth.atlassian.com/oauth/token".to_string(),
                resources_url: "https://api.atlassian.com/oauth/token/accessible-resources"
                    .to_string(),
                api_base_url: "https://api.atlassian.com".to_string(),
            },
            jira: IntegrationConfig {
                base_url: String::new(),
            },
            confluence: IntegrationConfig {
                base_url: String::new(),
            },
            http: HttpConfig { timeout_secs: 15 },
            jwt: JwtConfig {
                secret: "change-me".to_string(),
                token_ttl_secs: 3600,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("GATEWAY")
                .prefix_separator("_")
                .separator("__"),
        );

        let mut config: Config = builder.build()?.try_deserialize()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies the flat, documented environment variables on top of whatever
    /// the layered sources produced. These are the names deployments are
    /// expected to set, so they win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("ATLASSIAN_CLIENT_ID") {
            self.oauth.client_id = v;
        }
        if let Ok(v) = std::env::var("ATLASSIAN_CLIENT_SECRET") {
            self.oauth.client_secret = v;
        }
        if let Ok(v) = std::env::var("ATLASSIAN_REDIRECT_URI") {
            self.oauth.redirect_uri = v;
        }
        if let Ok(v) = std::env::var("CORS_ORIGINS") {
            self.cors.origins = v
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("JIRA_BASE_URL") {
            self.jira.base_url = v;
        }
        if let Ok(v) = std::env::var("CONFLUENCE_BASE_URL") {
            self.confluence.base_url = v;
        }
        if let Ok(v) = std::env::var("APP_ENV") {
            self.app.env = v;
        }
        if let Ok(v) = std::env::var("APP_VERSION") {
            self.app.version = v;
        }
    }

    /// Whether CORS should allow any origin (no explicit list configured, or
    /// a single wildcard entry).
    pub fn cors_allow_any(&self) -> bool {
        self.cors.origins.is_empty()
            || (self.cors.origins.len() == 1 && self.cors.origins[0] == "*")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
        assert_eq!(
            config.oauth.authorization_url,
            "https://auth.atlassian.com/authorize"
        );
        assert_eq!(config.http.timeout_secs, 15);
        assert!(config.oauth.client_id.is_empty());
        assert!(config.cors_allow_any());
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 9000
oauth:
  client_id: "file-client"
  client_secret: "file-secret"
  redirect_uri: "http://localhost:9000/api/v1/auth/atlassian/callback"
logging:
  level: "warn"
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.oauth.client_id, "file-client");
        assert_eq!(config.logging.level, "warn");
        // Untouched sections keep their defaults.
        assert_eq!(config.http.timeout_secs, 15);
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let config = Config::load_from_file("nonexistent.yaml").unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_cors_allow_any() {
        let mut config = Config::default();
        assert!(config.cors_allow_any());

        config.cors.origins = vec!["*".to_string()];
        assert!(config.cors_allow_any());

        config.cors.origins = vec!["https://app.example.com".to_string()];
        assert!(!config.cors_allow_any());
    }
}
