//! Simulated user database with fixed latency.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::FetchError;
use crate::models::{NewUser, User};
use crate::store::BackingStore;

// == Memory User Store ==
/// In-memory user table standing in for a real database.
///
/// Keys are decimal user ids. Every call sleeps for `latency` before touching
/// the table.
#[derive(Debug)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<u64, User>>,
    latency: Duration,
}

impl MemoryUserStore {
    /// Creates a store seeded with users 1, 2 and 3.
    pub fn seeded(latency: Duration) -> Self {
        let users = [
            User::new(1, "Alice Johnson", "alice@example.com"),
            User::new(2, "Bob Smith", "bob@example.com"),
            User::new(3, "Charlie Brown", "charlie@example.com"),
        ];
        Self::with_users(users, latency)
    }

    pub fn with_users(users: impl IntoIterator<Item = User>, latency: Duration) -> Self {
        Self {
            users: RwLock::new(users.into_iter().map(|u| (u.id, u)).collect()),
            latency,
        }
    }

    // == Create ==
    /// Inserts a new user under the next free id.
    pub async fn create(&self, new_user: NewUser) -> User {
        tokio::time::sleep(self.latency).await;

        let mut users = self.users.write().await;
        let id = users.keys().max().copied().unwrap_or(0) + 1;
        let user = User::new(id, new_user.name, new_user.email);
        users.insert(id, user.clone());
        debug!(id, "user created");
        user
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl BackingStore for MemoryUserStore {
    type Value = User;

    async fn fetch(&self, key: &str) -> Result<User, FetchError> {
        tokio::time::sleep(self.latency).await;

        let id: u64 = key
            .parse()
            .map_err(|_| FetchError::NotFound(key.to_string()))?;

        self.users
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_users() {
        let store = MemoryUserStore::seeded(Duration::ZERO);

        assert_eq!(store.len().await, 3);
        let user = store.fetch("2").await.unwrap();
        assert_eq!(user.id, 2);
        assert_eq!(user.name, "Bob Smith");
    }

    #[tokio::test]
    async fn test_fetch_unknown_key() {
        let store = MemoryUserStore::seeded(Duration::ZERO);

        assert_eq!(
            store.fetch("999").await,
            Err(FetchError::NotFound("999".to_string()))
        );
        assert_eq!(
            store.fetch("not-a-number").await,
            Err(FetchError::NotFound("not-a-number".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = MemoryUserStore::seeded(Duration::ZERO);

        let user = store
            .create(NewUser {
                name: "Dana".to_string(),
                email: "dana@example.com".to_string(),
            })
            .await;

        assert_eq!(user.id, 4);
        assert_eq!(store.fetch("4").await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_fetch_waits_for_latency() {
        let store = MemoryUserStore::seeded(Duration::from_millis(50));

        let started = std::time::Instant::now();
        store.fetch("1").await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
