//! In-memory user directory implementation

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::{UserDirectory, UserId, UserIdentity};
use crate::domain::DomainError;

/// In-memory implementation of UserDirectory
///
/// Used by tests and by embedders that keep a small, preloaded account list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserDirectory {
    users: Arc<RwLock<HashMap<UserId, UserIdentity>>>,
}

impl InMemoryUserDirectory {
    /// Create a new empty directory
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory with initial users
    pub fn with_users(users: Vec<UserIdentity>) -> Self {
        let users = users.into_iter().map(|u| (u.id(), u)).collect();

        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }

    /// Add or replace a user
    pub async fn upsert(&self, user: UserIdentity) {
        self.users.write().await.insert(user.id(), user);
    }

    /// Remove a user, returning whether it existed
    pub async fn remove(&self, id: UserId) -> bool {
        self.users.write().await.remove(&id).is_some()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_identity(&self, id: UserId) -> Result<Option<UserIdentity>, DomainError> {
        Ok(self.users.read().await.get(&id).cloned())
    }
}
