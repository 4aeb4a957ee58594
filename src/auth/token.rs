use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Tokens within this margin of expiry are treated as expired so a request
/// never leaves with a token that dies in flight.
pub const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// The credentials obtained from an authorization-code exchange or refresh
/// grant. Raw token values stay inside the process.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRecord {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub scope: Option<String>,
}

impl TokenRecord {
    pub fn is_expired(&self) -> bool {
        Utc::now() + chrono::Duration::seconds(EXPIRY_MARGIN_SECONDS) >= self.expires_at
    }
}

/// Process-wide cache holding at most one credential set. Overwritten on
/// every successful exchange or refresh; cleared only by restart. Not scoped
/// per user, which is a documented limitation of this gateway.
pub struct TokenCache {
    slot: RwLock<Option<TokenRecord>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<TokenRecord> {
        self.slot.read().await.clone()
    }

    pub async fn set(&self, record: TokenRecord) {
        *self.slot.write().await = Some(record);
    }

    pub async fn clear(&self) {
        *self.slot.write().await = None;
    }

    pub async fn is_authenticated(&self) -> bool {
        self.slot
            .read()
            .await
            .as_ref()
            .is_some_and(|record| !record.is_expired())
    }
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new()
    }
}
