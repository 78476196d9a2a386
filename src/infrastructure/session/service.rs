//! Session lifecycle service
//!
//! Issues access/refresh token pairs, rotates refresh tokens on use and
//! revokes them on logout. This is the only writer of the `revoked` flag.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::store::{ClientInfo, RefreshTokenStore};
use crate::domain::session::{AccessClaims, RefreshToken, RevokeOutcome, TokenError};
use crate::domain::user::{UserDirectory, UserId, UserIdentity};
use crate::infrastructure::auth::AccessTokenIssuer;

/// Access and refresh token handed to a client after login or rotation
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

impl SessionTokens {
    /// The opaque refresh token string to hand to the client
    pub fn refresh_token_value(&self) -> &str {
        self.refresh_token.token()
    }
}

/// Session lifecycle manager
#[derive(Clone)]
pub struct SessionService {
    issuer: Arc<dyn AccessTokenIssuer>,
    store: RefreshTokenStore,
    directory: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for SessionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionService")
            .field("issuer", &self.issuer)
            .field("store", &self.store)
            .finish()
    }
}

impl SessionService {
    /// Create a new session service
    pub fn new(
        issuer: Arc<dyn AccessTokenIssuer>,
        store: RefreshTokenStore,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            issuer,
            store,
            directory,
        }
    }

    pub fn store(&self) -> &RefreshTokenStore {
        &self.store
    }

    /// Start a session for a user whose credentials were already checked
    pub async fn login(
        &self,
        user: &UserIdentity,
        client: ClientInfo,
        now: DateTime<Utc>,
    ) -> Result<SessionTokens, TokenError> {
        let access_token = self.issuer.issue(user, now)?;
        let refresh_token = self.store.create(user, client, now).await?;

        info!(user_id = %user.id(), session = %refresh_token.id(), "Session started");

        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token and a replacement refresh token
    ///
    /// The presented token is revoked as part of the exchange. Of concurrent
    /// calls presenting the same token exactly one succeeds; the others
    /// observe `RefreshTokenRevoked`.
    ///
    /// The access token is signed before anything is written. If persisting
    /// the replacement fails after the presented token was revoked, the
    /// session is lost and the client has to sign in again.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionTokens, TokenError> {
        self.rotate(refresh_token, now)
            .await
            .inspect_err(|e| log_rejection("refresh", e))
    }

    async fn rotate(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionTokens, TokenError> {
        let current = match self.store.find_by_token(refresh_token).await {
            Ok(token) => token,
            Err(TokenError::NotFound) => return Err(TokenError::RefreshTokenNotFound),
            Err(e) => return Err(e),
        };

        if current.is_revoked() {
            return Err(TokenError::RefreshTokenRevoked);
        }

        if current.is_expired_at(now) {
            return Err(TokenError::RefreshTokenExpired);
        }

        let user = self
            .directory
            .find_identity(current.user_id())
            .await?
            .ok_or(TokenError::UserNotFound {
                user_id: current.user_id().value(),
            })?;

        let access_token = self.issuer.issue(&user, now)?;

        match self.store.revoke_if_active(refresh_token, now).await? {
            RevokeOutcome::Revoked(_) => {}
            RevokeOutcome::AlreadyRevoked => return Err(TokenError::RefreshTokenRevoked),
            RevokeOutcome::NotFound => return Err(TokenError::RefreshTokenNotFound),
        }

        let replacement = self
            .store
            .create(&user, ClientInfo::of(&current), now)
            .await?;

        info!(
            user_id = %user.id(),
            previous = %current.id(),
            session = %replacement.id(),
            "Refresh token rotated"
        );

        Ok(SessionTokens {
            access_token,
            refresh_token: replacement,
        })
    }

    /// End a session
    ///
    /// Logging out a revoked or expired token succeeds. Only a token that
    /// was never issued is an error.
    pub async fn logout(&self, refresh_token: &str, now: DateTime<Utc>) -> Result<(), TokenError> {
        match self.store.revoke(refresh_token, now).await {
            Ok(()) => {
                info!("Session ended");
                Ok(())
            }
            Err(TokenError::NotFound) => {
                let error = TokenError::RefreshTokenNotFound;
                log_rejection("logout", &error);
                Err(error)
            }
            Err(e) => Err(e),
        }
    }

    /// End every session of a user, returning how many were active
    pub async fn logout_everywhere(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, TokenError> {
        let count = self.store.revoke_all_for_user(user_id, now).await?;

        info!(user_id = %user_id, revoked = count, "All sessions ended");

        Ok(count)
    }

    /// Verify an access token presented on a request
    pub fn authenticate(
        &self,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> Result<AccessClaims, TokenError> {
        self.issuer
            .verify(access_token, now)
            .inspect_err(|e| log_rejection("authenticate", e))
    }

    /// Sessions of a user still usable at `now`, newest first
    pub async fn active_sessions(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<Vec<RefreshToken>, TokenError> {
        self.store.list_active_for_user(user_id, now).await
    }
}

fn log_rejection(operation: &str, error: &TokenError) {
    if error.requires_reauthentication() {
        warn!(operation, kind = error.kind(), "Credential rejected");
    } else {
        warn!(operation, kind = error.kind(), error = %error, "Session operation failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::domain::session::MockRefreshTokenRepository;
    use crate::domain::user::{MockUserDirectory, UserRole};
    use crate::domain::{DomainError, RefreshTokenRepository};
    use crate::infrastructure::auth::JwtService;
    use crate::infrastructure::session::InMemoryRefreshTokenRepository;
    use crate::infrastructure::user::InMemoryUserDirectory;
    use chrono::{Duration, TimeZone};

    const TEST_SECRET: &str = "test-secret-key-for-testing-purposes-minimum-32-chars";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn create_test_user() -> UserIdentity {
        UserIdentity::new(UserId::new(1).unwrap(), "test@example.com", UserRole::Student).unwrap()
    }

    fn client() -> ClientInfo {
        ClientInfo::new(Some("Test Device".to_string()), Some("127.0.0.1".to_string()))
    }

    struct Fixture {
        service: SessionService,
        repository: Arc<InMemoryRefreshTokenRepository>,
        directory: Arc<InMemoryUserDirectory>,
    }

    fn create_fixture() -> Fixture {
        let config = AuthConfig::new(TEST_SECRET);
        let repository = Arc::new(InMemoryRefreshTokenRepository::new());
        let directory = Arc::new(InMemoryUserDirectory::with_users(vec![create_test_user()]));
        let issuer = Arc::new(JwtService::from_config(&config).unwrap());
        let store = RefreshTokenStore::from_config(repository.clone(), &config).unwrap();

        Fixture {
            service: SessionService::new(issuer, store, directory.clone()),
            repository,
            directory,
        }
    }

    #[tokio::test]
    async fn test_login_issues_pair() {
        let fixture = create_fixture();
        let user = create_test_user();

        let tokens = fixture.service.login(&user, client(), t0()).await.unwrap();

        let claims = fixture.service.authenticate(&tokens.access_token, t0()).unwrap();
        assert_eq!(claims.identity().unwrap(), user);
        assert!(tokens.refresh_token.is_usable(t0()));
        assert_eq!(tokens.refresh_token.device_info(), Some("Test Device"));

        let stored = fixture
            .repository
            .find_by_token(tokens.refresh_token_value())
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_end_to_end_rotation() {
        let fixture = create_fixture();
        let service = &fixture.service;

        let login = service.login(&create_test_user(), client(), t0()).await.unwrap();
        let r0 = login.refresh_token_value().to_string();
        assert!(service.store().find_by_token(&r0).await.unwrap().is_usable(t0()));

        let rotated = service.refresh(&r0, t0() + Duration::seconds(1)).await.unwrap();
        let r1 = rotated.refresh_token_value().to_string();
        assert_ne!(r0, r1);
        assert!(service
            .authenticate(&rotated.access_token, t0() + Duration::seconds(1))
            .is_ok());

        let old = service.store().find_by_token(&r0).await.unwrap();
        assert!(old.is_revoked());
        assert_eq!(old.revoked_at(), Some(t0() + Duration::seconds(1)));

        assert!(matches!(
            service.refresh(&r0, t0() + Duration::seconds(2)).await,
            Err(TokenError::RefreshTokenRevoked)
        ));
        assert!(service.refresh(&r1, t0() + Duration::seconds(2)).await.is_ok());
    }

    #[tokio::test]
    async fn test_rotation_keeps_client_info() {
        let fixture = create_fixture();
        let login = fixture
            .service
            .login(&create_test_user(), client(), t0())
            .await
            .unwrap();

        let rotated = fixture
            .service
            .refresh(login.refresh_token_value(), t0())
            .await
            .unwrap();

        assert_eq!(ClientInfo::of(&rotated.refresh_token), client());
        assert_eq!(rotated.refresh_token.user_id(), login.refresh_token.user_id());
    }

    #[tokio::test]
    async fn test_refresh_unknown_token() {
        let fixture = create_fixture();

        assert!(matches!(
            fixture.service.refresh("never-issued", t0()).await,
            Err(TokenError::RefreshTokenNotFound)
        ));
    }

    #[tokio::test]
    async fn test_refresh_expired_token() {
        let fixture = create_fixture();
        let login = fixture
            .service
            .login(&create_test_user(), client(), t0())
            .await
            .unwrap();
        let expires_at = login.refresh_token.expires_at();

        assert!(matches!(
            fixture
                .service
                .refresh(login.refresh_token_value(), expires_at)
                .await,
            Err(TokenError::RefreshTokenExpired)
        ));

        // A rejected refresh leaves the token unrevoked
        let stored = fixture
            .service
            .store()
            .find_by_token(login.refresh_token_value())
            .await
            .unwrap();
        assert!(!stored.is_revoked());
    }

    #[tokio::test]
    async fn test_refresh_revoked_and_expired_reports_revoked() {
        let fixture = create_fixture();
        let login = fixture
            .service
            .login(&create_test_user(), client(), t0())
            .await
            .unwrap();
        fixture
            .service
            .logout(login.refresh_token_value(), t0())
            .await
            .unwrap();

        assert!(matches!(
            fixture
                .service
                .refresh(login.refresh_token_value(), t0() + Duration::days(30))
                .await,
            Err(TokenError::RefreshTokenRevoked)
        ));
    }

    #[tokio::test]
    async fn test_refresh_for_removed_user() {
        let fixture = create_fixture();
        let user = create_test_user();
        let login = fixture.service.login(&user, client(), t0()).await.unwrap();

        fixture.directory.remove(user.id()).await;

        assert!(matches!(
            fixture.service.refresh(login.refresh_token_value(), t0()).await,
            Err(TokenError::UserNotFound { user_id: 1 })
        ));

        let stored = fixture
            .service
            .store()
            .find_by_token(login.refresh_token_value())
            .await
            .unwrap();
        assert!(!stored.is_revoked());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let fixture = create_fixture();
        let user = create_test_user();
        let login = fixture.service.login(&user, client(), t0()).await.unwrap();

        let promoted = UserIdentity::new(user.id(), user.email(), UserRole::Instructor).unwrap();
        fixture.directory.upsert(promoted).await;

        let rotated = fixture
            .service
            .refresh(login.refresh_token_value(), t0())
            .await
            .unwrap();
        let claims = fixture
            .service
            .authenticate(&rotated.access_token, t0())
            .unwrap();

        assert_eq!(claims.role, UserRole::Instructor);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refresh_single_rotation() {
        let fixture = create_fixture();
        let service = Arc::new(fixture.service.clone());
        let login = service.login(&create_test_user(), client(), t0()).await.unwrap();
        let token = login.refresh_token_value().to_string();

        let attempts = (0..16).map(|_| {
            let service = service.clone();
            let token = token.clone();
            tokio::spawn(async move { service.refresh(&token, t0()).await })
        });

        let results = futures::future::join_all(attempts).await;

        let mut successes = 0;
        for result in results {
            match result.unwrap() {
                Ok(_) => successes += 1,
                Err(TokenError::RefreshTokenRevoked) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(successes, 1);
        // Original token plus exactly one replacement
        assert_eq!(fixture.repository.len().await, 2);
    }

    #[tokio::test]
    async fn test_logout() {
        let fixture = create_fixture();
        let login = fixture
            .service
            .login(&create_test_user(), client(), t0())
            .await
            .unwrap();
        let token = login.refresh_token_value();

        fixture.service.logout(token, t0()).await.unwrap();
        // Already revoked: still a success
        fixture.service.logout(token, t0()).await.unwrap();

        assert!(matches!(
            fixture.service.refresh(token, t0()).await,
            Err(TokenError::RefreshTokenRevoked)
        ));
    }

    #[tokio::test]
    async fn test_logout_expired_token_succeeds() {
        let fixture = create_fixture();
        let login = fixture
            .service
            .login(&create_test_user(), client(), t0())
            .await
            .unwrap();

        fixture
            .service
            .logout(login.refresh_token_value(), t0() + Duration::days(60))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_logout_unknown_token() {
        let fixture = create_fixture();

        assert!(matches!(
            fixture.service.logout("never-issued", t0()).await,
            Err(TokenError::RefreshTokenNotFound)
        ));
    }

    #[tokio::test]
    async fn test_logout_everywhere() {
        let fixture = create_fixture();
        let user = create_test_user();

        let laptop = fixture.service.login(&user, client(), t0()).await.unwrap();
        let phone = fixture.service.login(&user, ClientInfo::default(), t0()).await.unwrap();
        assert_eq!(
            fixture.service.active_sessions(user.id(), t0()).await.unwrap().len(),
            2
        );

        let count = fixture.service.logout_everywhere(user.id(), t0()).await.unwrap();
        assert_eq!(count, 2);
        assert!(fixture
            .service
            .active_sessions(user.id(), t0())
            .await
            .unwrap()
            .is_empty());

        for token in [laptop.refresh_token_value(), phone.refresh_token_value()] {
            assert!(matches!(
                fixture.service.refresh(token, t0()).await,
                Err(TokenError::RefreshTokenRevoked)
            ));
        }
    }

    #[tokio::test]
    async fn test_access_token_survives_logout() {
        let fixture = create_fixture();
        let login = fixture
            .service
            .login(&create_test_user(), client(), t0())
            .await
            .unwrap();

        fixture
            .service
            .logout(login.refresh_token_value(), t0())
            .await
            .unwrap();

        // Access tokens are stateless and only bounded by their lifetime
        assert!(fixture.service.authenticate(&login.access_token, t0()).is_ok());
        assert!(matches!(
            fixture
                .service
                .authenticate(&login.access_token, t0() + Duration::hours(1)),
            Err(TokenError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let config = AuthConfig::new(TEST_SECRET);
        let repository = Arc::new(InMemoryRefreshTokenRepository::new());
        let mut directory = MockUserDirectory::new();
        directory
            .expect_find_identity()
            .returning(|_| Err(DomainError::storage("directory offline")));

        let service = SessionService::new(
            Arc::new(JwtService::from_config(&config).unwrap()),
            RefreshTokenStore::from_config(repository, &config).unwrap(),
            Arc::new(directory),
        );

        let login = service.login(&create_test_user(), client(), t0()).await.unwrap();
        let result = service.refresh(login.refresh_token_value(), t0()).await;

        assert!(matches!(
            result,
            Err(TokenError::Store(DomainError::Storage { .. }))
        ));
    }

    #[tokio::test]
    async fn test_failed_replacement_insert_fails_closed() {
        let config = AuthConfig::new(TEST_SECRET);
        let presented = RefreshToken::new(
            "presented-token",
            UserId::new(1).unwrap(),
            t0() + Duration::days(7),
            Some("Test Device".to_string()),
            None,
            t0(),
        );

        let mut repository = MockRefreshTokenRepository::new();
        let found = presented.clone();
        repository
            .expect_find_by_token()
            .times(1)
            .returning(move |_| Ok(Some(found.clone())));
        let revoked = presented.clone();
        repository
            .expect_revoke_if_active()
            .times(1)
            .returning(move |_, now| {
                let mut token = revoked.clone();
                token.revoke(now);
                Ok(RevokeOutcome::Revoked(token))
            });
        repository
            .expect_insert()
            .times(1)
            .returning(|_| Err(DomainError::storage("disk full")));

        let service = SessionService::new(
            Arc::new(JwtService::from_config(&config).unwrap()),
            RefreshTokenStore::from_config(Arc::new(repository), &config).unwrap(),
            Arc::new(InMemoryUserDirectory::with_users(vec![create_test_user()])),
        );

        let result = service.refresh("presented-token", t0()).await;

        assert!(matches!(
            result,
            Err(TokenError::Store(DomainError::Storage { .. }))
        ));
        assert_eq!(result.unwrap_err().public_message(), "Authentication service unavailable");
    }

    /// Stores reads and revocations in memory but refuses new tokens
    struct RejectingInserts(InMemoryRefreshTokenRepository);

    #[async_trait::async_trait]
    impl RefreshTokenRepository for RejectingInserts {
        async fn insert(&self, _token: RefreshToken) -> Result<RefreshToken, DomainError> {
            Err(DomainError::storage("disk full"))
        }

        async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError> {
            self.0.find_by_token(token).await
        }

        async fn revoke_if_active(
            &self,
            token: &str,
            now: DateTime<Utc>,
        ) -> Result<RevokeOutcome, DomainError> {
            self.0.revoke_if_active(token, now).await
        }

        async fn revoke_all_for_user(
            &self,
            user_id: UserId,
            now: DateTime<Utc>,
        ) -> Result<u64, DomainError> {
            self.0.revoke_all_for_user(user_id, now).await
        }

        async fn list_for_user(&self, user_id: UserId) -> Result<Vec<RefreshToken>, DomainError> {
            self.0.list_for_user(user_id).await
        }
    }

    #[tokio::test]
    async fn test_failed_replacement_leaves_presented_token_revoked() {
        let config = AuthConfig::new(TEST_SECRET);
        let inner = InMemoryRefreshTokenRepository::new();
        let user = create_test_user();

        let seeded = RefreshTokenStore::from_config(Arc::new(inner.clone()), &config)
            .unwrap()
            .create(&user, client(), t0())
            .await
            .unwrap();

        let service = SessionService::new(
            Arc::new(JwtService::from_config(&config).unwrap()),
            RefreshTokenStore::from_config(Arc::new(RejectingInserts(inner.clone())), &config)
                .unwrap(),
            Arc::new(InMemoryUserDirectory::with_users(vec![user])),
        );

        assert!(service.refresh(seeded.token(), t0()).await.is_err());

        let stored = inner.find_by_token(seeded.token()).await.unwrap().unwrap();
        assert!(stored.is_revoked());
        assert_eq!(inner.len().await, 1);

        assert!(matches!(
            service.refresh(seeded.token(), t0()).await,
            Err(TokenError::RefreshTokenRevoked)
        ));
    }
}
