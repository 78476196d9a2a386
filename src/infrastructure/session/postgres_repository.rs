//! PostgreSQL refresh token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::domain::session::{RefreshToken, RefreshTokenId, RefreshTokenRepository, RevokeOutcome};
use crate::domain::user::UserId;
use crate::domain::DomainError;

const COLUMNS: &str = "id, token, user_id, expires_at, revoked, revoked_at, \
                       device_info, ip_address, created_at";

/// PostgreSQL implementation of RefreshTokenRepository
///
/// Rotation relies on row-level atomicity of a conditional `UPDATE` and on
/// the unique index over `token`; no application-level locking is used.
#[derive(Debug, Clone)]
pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn insert(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (id, token, user_id, expires_at, revoked, revoked_at,
                                        device_info, ip_address, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(token.id().as_uuid())
        .bind(token.token())
        .bind(token.user_id().value())
        .bind(token.expires_at())
        .bind(token.is_revoked())
        .bind(token.revoked_at())
        .bind(token.device_info())
        .bind(token.ip_address())
        .bind(token.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, token.user_id()))?;

        debug!(user_id = %token.user_id(), id = %token.id(), "Inserted refresh token");

        Ok(token)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError> {
        let query = format!("SELECT {} FROM refresh_tokens WHERE token = $1", COLUMNS);

        let row = sqlx::query(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get refresh token: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    async fn revoke_if_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<RevokeOutcome, DomainError> {
        let query = format!(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2
            WHERE token = $1 AND revoked = FALSE
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(token)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to revoke refresh token: {}", e)))?;

        if let Some(row) = row {
            return Ok(RevokeOutcome::Revoked(row_to_token(&row)?));
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM refresh_tokens WHERE token = $1)")
                .bind(token)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to check refresh token: {}", e))
                })?;

        if exists {
            Ok(RevokeOutcome::AlreadyRevoked)
        } else {
            Ok(RevokeOutcome::NotFound)
        }
    }

    async fn revoke_all_for_user(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id.value())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to revoke user tokens: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<RefreshToken>, DomainError> {
        let query = format!(
            "SELECT {} FROM refresh_tokens WHERE user_id = $1 ORDER BY created_at DESC",
            COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id.value())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list refresh tokens: {}", e)))?;

        let mut tokens = Vec::with_capacity(rows.len());

        for row in rows {
            tokens.push(row_to_token(&row)?);
        }

        Ok(tokens)
    }
}

fn map_insert_error(error: sqlx::Error, user_id: UserId) -> DomainError {
    let unique_violation = error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());

    if unique_violation {
        DomainError::conflict(format!(
            "Refresh token for user {} collides with an existing token",
            user_id
        ))
    } else {
        DomainError::storage(format!("Failed to insert refresh token: {}", error))
    }
}

fn row_to_token(row: &PgRow) -> Result<RefreshToken, DomainError> {
    let get_err = |e: sqlx::Error| DomainError::storage(format!("Failed to read column: {}", e));

    let id: Uuid = row.try_get("id").map_err(get_err)?;
    let token: String = row.try_get("token").map_err(get_err)?;
    let user_id: i64 = row.try_get("user_id").map_err(get_err)?;
    let expires_at: DateTime<Utc> = row.try_get("expires_at").map_err(get_err)?;
    let revoked: bool = row.try_get("revoked").map_err(get_err)?;
    let revoked_at: Option<DateTime<Utc>> = row.try_get("revoked_at").map_err(get_err)?;
    let device_info: Option<String> = row.try_get("device_info").map_err(get_err)?;
    let ip_address: Option<String> = row.try_get("ip_address").map_err(get_err)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(get_err)?;

    let user_id = UserId::new(user_id)
        .map_err(|e| DomainError::storage(format!("Invalid user_id in refresh_tokens: {}", e)))?;

    Ok(RefreshToken::from_parts(
        RefreshTokenId::from_uuid(id),
        token,
        user_id,
        expires_at,
        revoked,
        revoked_at,
        device_info,
        ip_address,
        created_at,
    ))
}
