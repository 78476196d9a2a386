//! In-memory refresh token repository implementation

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::session::{RefreshToken, RefreshTokenRepository, RevokeOutcome};
use crate::domain::user::UserId;
use crate::domain::DomainError;

#[derive(Debug, Default)]
struct Tables {
    tokens: HashMap<String, RefreshToken>,
    /// Index for user ID -> owned token strings
    by_user: HashMap<UserId, HashSet<String>>,
}

/// In-memory implementation of RefreshTokenRepository
///
/// Both tables sit behind one lock so every state transition happens under
/// a single write guard.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRefreshTokenRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial tokens
    pub fn with_tokens(tokens: Vec<RefreshToken>) -> Self {
        let mut tables = Tables::default();

        for token in tokens {
            tables
                .by_user
                .entry(token.user_id())
                .or_default()
                .insert(token.token().to_string());
            tables.tokens.insert(token.token().to_string(), token);
        }

        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    /// Number of stored tokens, revoked ones included
    pub async fn len(&self) -> usize {
        self.tables.read().await.tokens.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        let mut tables = self.tables.write().await;

        if tables.tokens.contains_key(token.token()) {
            return Err(DomainError::conflict(format!(
                "Refresh token for user {} collides with an existing token",
                token.user_id()
            )));
        }

        tables
            .by_user
            .entry(token.user_id())
            .or_default()
            .insert(token.token().to_string());
        tables
            .tokens
            .insert(token.token().to_string(), token.clone());

        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.tokens.get(token).cloned())
    }

    async fn revoke_if_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, DomainError> {
        let mut tables = self.tables.write().await;

        let outcome = match tables.tokens.get_mut(token) {
            Some(record) => {
                if record.revoke(now) {
                    RevokeOutcome::Revoked(record.clone())
                } else {
                    RevokeOutcome::AlreadyRevoked
                }
            }
            None => RevokeOutcome::NotFound,
        };

        Ok(outcome)
    }

    async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;

        let Some(owned) = tables.by_user.get(&user_id) else {
            return Ok(0);
        };

        let mut count = 0;

        for token in owned {
            if let Some(record) = tables.tokens.get_mut(token) {
                if record.revoke(now) {
                    count += 1;
                }
            }
        }

        Ok(count)
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<RefreshToken>, DomainError> {
        let tables = self.tables.read().await;

        let mut result: Vec<RefreshToken> = tables
            .by_user
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|token| tables.tokens.get(token).cloned())
            .collect();

        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));

        Ok(result)
    }
}
