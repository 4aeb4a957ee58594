pub mod jwt;
pub mod oauth;
pub mod state;
pub mod token;

pub use oauth::OAuthService;
pub use state::StateStore;
pub use token::{TokenCache, TokenRecord};
