use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use rand::RngCore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// OAuth state token TTL (10 minutes)
pub const STATE_TTL_SECONDS: i64 = 600;

const STATE_TOKEN_BYTES: usize = 32;

/// One-time CSRF state tokens binding an authorization redirect to its
/// callback. A token validates at most once and dies after its TTL,
/// whichever comes first.
pub struct StateStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Generates a random URL-safe token and records it with `now + TTL`.
    pub async fn create(&self) -> String {
        let token = generate_state_token();
        let expires_at = Utc::now() + chrono::Duration::seconds(STATE_TTL_SECONDS);

        let mut entries = self.entries.write().await;
        entries.insert(token.clone(), expires_at);
        token
    }

    /// Consumes the token if it is known and unexpired. Expired entries are
    /// swept here rather than by a background task.
    pub async fn validate_and_consume(&self, token: &str) -> bool {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, expires_at| *expires_at > now);
        entries.remove(token).is_some()
    }

    pub async fn contains(&self, token: &str) -> bool {
        self.entries.read().await.contains_key(token)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn insert_with_expiry(&self, token: &str, expires_at: DateTime<Utc>) {
        self.entries
            .write()
            .await
            .insert(token.to_string(), expires_at);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_state_token() -> String {
    let mut bytes = [0u8; STATE_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_validates_exactly_once() {
        let store = StateStore::new();
        let token = store.create().await;
        assert!(token.len() > 10);
        assert!(store.contains(&token).await);

        assert!(store.validate_and_consume(&token).await);
        assert!(!store.validate_and_consume(&token).await);
        assert!(!store.contains(&token).await);
    }

    #[tokio::test]
    async fn test_unknown_state_fails() {
        let store = StateStore::new();
        assert!(!store.validate_and_consume("never-issued").await);
    }

    #[tokio::test]
    async fn test_expired_state_fails_validation() {
        let store = StateStore::new();
        store
            .insert_with_expiry("stale", Utc::now() - chrono::Duration::seconds(1))
            .await;

        assert!(!store.validate_and_consume("stale").await);
        // The sweep removed it entirely.
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_validation_sweeps_other_expired_entries() {
        let store = StateStore::new();
        store
            .insert_with_expiry("stale-1", Utc::now() - chrono::Duration::seconds(5))
            .await;
        store
            .insert_with_expiry("stale-2", Utc::now() - chrono::Duration::seconds(5))
            .await;
        let live = store.create().await;

        assert!(store.validate_and_consume(&live).await);
        assert_eq!(store.len().await, 0);
    }

    #[test]
    fn test_tokens_are_url_safe_and_unique() {
        let a = generate_state_token();
        let b = generate_state_token();
        assert_ne!(a, b);
        assert!(a
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
