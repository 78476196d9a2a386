//! User directory trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{UserId, UserIdentity};
use crate::domain::DomainError;

/// Lookup of current user identities, owned by the account service
///
/// Refresh tokens only carry the owning user's id. When a token is rotated
/// the session manager asks the directory for the user's current email and
/// role so the new access token reflects them. Implementations return
/// `None` for users that no longer exist or may no longer sign in.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get the identity projection of an active user
    async fn find_identity(&self, id: UserId) -> Result<Option<UserIdentity>, DomainError>;
}
