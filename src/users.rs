use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Public view of a registered user; never carries the password digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredUser {
    record: UserRecord,
    password_digest: String,
}

/// In-memory registry backing the user registration/login scaffolding.
/// Cleared on restart; no persistence by design.
pub struct UserStore {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, request: UserCreate) -> Result<UserRecord, AppError> {
        if request.username.is_empty() || request.password.is_empty() {
            return Err(AppError::BadRequest(
                "username and password are required".to_string(),
            ));
        }

        let mut users = self.users.write().await;
        if users.contains_key(&request.username) {
            return Err(AppError::BadRequest(format!(
                "username '{}' is already taken",
                request.username
            )));
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: request.username.clone(),
            email: request.email,
            full_name: request.full_name,
            role: "user".to_string(),
            created_at: Utc::now(),
        };

        users.insert(
            request.username,
            StoredUser {
                record: record.clone(),
                password_digest: digest(&request.password),
            },
        );
        Ok(record)
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord> {
        let users = self.users.read().await;
        users
            .get(username)
            .filter(|user| user.password_digest == digest(password))
            .map(|user| user.record.clone())
    }

    pub async fn get(&self, username: &str) -> Option<UserRecord> {
        self.users
            .read()
            .await
            .get(username)
            .map(|user| user.record.clone())
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}

fn digest(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserCreate {
        UserCreate {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "s3cret".to_string(),
            full_name: Some("Alice Example".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let store = UserStore::new();
        let record = store.register(alice()).await.unwrap();
        assert_eq!(record.username, "alice");
        assert_eq!(record.role, "user");

        let authed = store.authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(authed.id, record.id);

        assert!(store.authenticate("alice", "wrong").await.is_none());
        assert!(store.authenticate("bob", "s3cret").await.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_duplicate_username() {
        let store = UserStore::new();
        store.register(alice()).await.unwrap();

        let err = store.register(alice()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_register_rejects_empty_credentials() {
        let store = UserStore::new();
        let mut request = alice();
        request.password = String::new();

        assert!(store.register(request).await.is_err());
    }
}
