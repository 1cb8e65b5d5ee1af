// Session lifecycle: login, logout, refresh rotation, registration

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::{
    error::AuthError,
    models::{AuthResponse, LoginIdentifier, LoginRequest, NewUser, RegisterRequest, UserResponse},
    password::PasswordService,
    repository::UserStore,
    token::TokenService,
};

/// Orchestrates credential verification and the refresh-token lifecycle.
///
/// A user has at most one active refresh token: login overwrites it, refresh
/// rotates it, logout clears it. Any previously issued refresh token stops
/// validating the moment a newer one is persisted.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenService,
}

impl AuthService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Register a new user and return the secret-stripped profile.
    pub async fn register(&self, request: RegisterRequest) -> Result<UserResponse, AuthError> {
        request.validate()?;

        let username = request.username.trim().to_lowercase();
        let email = request.email.trim().to_lowercase();
        let full_name = request.full_name.trim().to_string();
        if username.is_empty() || email.is_empty() || full_name.is_empty() {
            return Err(AuthError::ValidationError(
                "username, email and full_name are required".to_string(),
            ));
        }

        let password_hash = PasswordService::hash_password(&request.password)?;

        let user = self
            .store
            .create_user(NewUser {
                username,
                email,
                full_name,
                password_hash,
                avatar_url: request.avatar_url,
                cover_image_url: request.cover_image_url,
            })
            .await?;

        info!("registered user {}", user.username);
        Ok(user.into())
    }

    /// Verify credentials and start a session.
    ///
    /// "No such user" and "wrong password" stay distinct here for logging and
    /// abuse detection; the HTTP layer collapses both to the same 401.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        if request.password.is_empty() {
            return Err(AuthError::ValidationError(
                "password is required".to_string(),
            ));
        }

        let identifier =
            LoginIdentifier::resolve(request.username.as_deref(), request.email.as_deref())
                .ok_or_else(|| {
                    AuthError::ValidationError("username or email is required".to_string())
                })?;

        let user = self
            .store
            .find_by_identifier(&identifier)
            .await?
            .ok_or_else(|| {
                warn!("login failed: no user for {:?}", identifier);
                AuthError::UserNotFound
            })?;

        if !PasswordService::verify_password(&request.password, &user.password_hash)? {
            warn!("login failed: bad password for user {}", user.id);
            return Err(AuthError::InvalidPassword);
        }

        let (access_token, refresh_token) = self.tokens.issue_token_pair(user.id)?;
        // Overwrites any earlier refresh token: single active session per user
        self.store
            .set_refresh_token(user.id, Some(&refresh_token))
            .await?;

        info!("user {} logged in", user.id);
        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
        })
    }

    /// Invalidate the persisted refresh token. Idempotent: logging out twice,
    /// or after the account disappeared, still succeeds.
    pub async fn logout(&self, user_id: Uuid) -> Result<(), AuthError> {
        self.store.set_refresh_token(user_id, None).await?;
        info!("user {} logged out", user_id);
        Ok(())
    }

    /// Rotate the token pair against a presented refresh token.
    ///
    /// The compare-and-swap against the persisted hash both detects replay of
    /// a rotated-out token and serializes concurrent refreshes: of two racers
    /// presenting the same token, exactly one wins.
    pub async fn refresh(&self, presented: Option<&str>) -> Result<AuthResponse, AuthError> {
        let presented = presented
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify_refresh_token(presented)?;

        let user = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let (access_token, refresh_token) = self.tokens.issue_token_pair(user.id)?;

        let rotated = self
            .store
            .swap_refresh_token(user.id, presented, &refresh_token)
            .await?;
        if !rotated {
            warn!("refresh rejected for user {}: token stale or reused", user.id);
            return Err(AuthError::StaleRefreshToken);
        }

        debug!("rotated refresh token for user {}", user.id);
        Ok(AuthResponse {
            user: user.into(),
            access_token,
            refresh_token,
        })
    }

    /// Load the secret-stripped profile for an authenticated id.
    pub async fn current_user(&self, user_id: Uuid) -> Result<UserResponse, AuthError> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::test_config;
    use crate::auth::repository::memory::MemoryUserStore;

    fn test_service() -> AuthService {
        let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
        AuthService::new(store, TokenService::new(&test_config()))
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            username: "Alice".to_string(),
            email: "Alice@Example.com".to_string(),
            full_name: "Alice Doe".to_string(),
            password: "sup3r-secret".to_string(),
            avatar_url: None,
            cover_image_url: None,
        }
    }

    fn login_by_username(password: &str) -> LoginRequest {
        LoginRequest {
            username: Some("alice".to_string()),
            email: None,
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_username_and_email() {
        let service = test_service();
        let user = service.register(register_request()).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let service = test_service();
        let mut request = register_request();
        request.password = "short".to_string();

        assert!(matches!(
            service.register(request).await,
            Err(AuthError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_login_with_username_or_email() {
        let service = test_service();
        service.register(register_request()).await.unwrap();

        let by_username = service.login(login_by_username("sup3r-secret")).await;
        assert!(by_username.is_ok());

        let by_email = service
            .login(LoginRequest {
                username: None,
                email: Some(" ALICE@example.com ".to_string()),
                password: "sup3r-secret".to_string(),
            })
            .await;
        assert!(by_email.is_ok());
    }

    #[tokio::test]
    async fn test_login_failures_are_distinguished_internally() {
        let service = test_service();
        service.register(register_request()).await.unwrap();

        let unknown = service
            .login(LoginRequest {
                username: Some("nobody".to_string()),
                email: None,
                password: "whatever-pass".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(AuthError::UserNotFound)));

        let wrong = service.login(login_by_username("wrong-password")).await;
        assert!(matches!(wrong, Err(AuthError::InvalidPassword)));
    }

    #[tokio::test]
    async fn test_login_issues_verifiable_pair() {
        let service = test_service();
        let registered = service.register(register_request()).await.unwrap();

        let auth = service.login(login_by_username("sup3r-secret")).await.unwrap();
        let claims = service
            .tokens()
            .verify_access_token(&auth.access_token)
            .unwrap();
        assert_eq!(claims.sub, registered.id);
        assert_eq!(auth.user.id, registered.id);
    }

    #[tokio::test]
    async fn test_refresh_rotates_and_invalidates_prior_token() {
        let service = test_service();
        service.register(register_request()).await.unwrap();
        let auth = service.login(login_by_username("sup3r-secret")).await.unwrap();

        let rotated = service
            .refresh(Some(&auth.refresh_token))
            .await
            .unwrap();
        assert_ne!(rotated.refresh_token, auth.refresh_token);

        // Replaying the original token must fail now
        let replay = service.refresh(Some(&auth.refresh_token)).await;
        assert!(matches!(replay, Err(AuthError::StaleRefreshToken)));

        // The rotated token is the one that works
        assert!(service.refresh(Some(&rotated.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_have_one_winner() {
        let service = test_service();
        service.register(register_request()).await.unwrap();
        let auth = service.login(login_by_username("sup3r-secret")).await.unwrap();

        let (first, second) = tokio::join!(
            service.refresh(Some(&auth.refresh_token)),
            service.refresh(Some(&auth.refresh_token)),
        );
        assert_eq!(
            first.is_ok() as u8 + second.is_ok() as u8,
            1,
            "exactly one concurrent refresh may win"
        );
    }

    #[tokio::test]
    async fn test_second_login_invalidates_first_refresh_token() {
        let service = test_service();
        service.register(register_request()).await.unwrap();

        let first = service.login(login_by_username("sup3r-secret")).await.unwrap();
        let _second = service.login(login_by_username("sup3r-secret")).await.unwrap();

        let replay = service.refresh(Some(&first.refresh_token)).await;
        assert!(matches!(replay, Err(AuthError::StaleRefreshToken)));
    }

    #[tokio::test]
    async fn test_logout_kills_refresh_and_is_idempotent() {
        let service = test_service();
        let user = service.register(register_request()).await.unwrap();
        let auth = service.login(login_by_username("sup3r-secret")).await.unwrap();

        service.logout(user.id).await.unwrap();
        service.logout(user.id).await.unwrap();

        let replay = service.refresh(Some(&auth.refresh_token)).await;
        assert!(matches!(replay, Err(AuthError::StaleRefreshToken)));
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_missing_token() {
        let service = test_service();
        assert!(matches!(
            service.refresh(None).await,
            Err(AuthError::MissingToken)
        ));
        assert!(matches!(
            service.refresh(Some("")).await,
            Err(AuthError::MissingToken)
        ));
    }

    #[tokio::test]
    async fn test_refresh_with_access_token_fails() {
        let service = test_service();
        service.register(register_request()).await.unwrap();
        let auth = service.login(login_by_username("sup3r-secret")).await.unwrap();

        // Wrong token class: signed with the access secret
        let result = service.refresh(Some(&auth.access_token)).await;
        assert!(matches!(result, Err(AuthError::SignatureMismatch)));
    }
}
