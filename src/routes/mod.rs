pub mod auth;
pub mod confluence;
pub mod health;
pub mod integrations;
pub mod jira;
pub mod users;

pub use auth::create_auth_routes;
pub use confluence::create_confluence_routes;
pub use health::create_health_routes;
pub use integrations::create_integration_routes;
pub use jira::create_jira_routes;
pub use users::create_user_routes;
