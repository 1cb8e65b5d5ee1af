// Request authentication: the per-request gate for protected routes

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::{
    cookie::ACCESS_TOKEN_COOKIE,
    error::AuthError,
    models::UserResponse,
    repository::UserStore,
    token::TokenService,
};
use crate::AppState;

/// The authenticated identity attached to a request. Secret fields are
/// already stripped; handlers never see the password or refresh token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserResponse);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        state.resolver.resolve(parts).await.map(CurrentUser)
    }
}

/// Strategy for turning request credentials into an identity.
///
/// Chosen once at process startup; nothing request-controlled can change
/// which resolver is installed.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, parts: &Parts) -> Result<UserResponse, AuthError>;
}

/// Production resolver: verify the access token, then load the identity with
/// a single store lookup. No caching layer sits in between.
pub struct TokenIdentityResolver {
    tokens: TokenService,
    store: Arc<dyn UserStore>,
}

impl TokenIdentityResolver {
    pub fn new(tokens: TokenService, store: Arc<dyn UserStore>) -> Self {
        Self { tokens, store }
    }
}

#[async_trait]
impl IdentityResolver for TokenIdentityResolver {
    async fn resolve(&self, parts: &Parts) -> Result<UserResponse, AuthError> {
        let token = bearer_token(parts)
            .or_else(|| cookie_token(parts))
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify_access_token(&token)?;

        let user = self
            .store
            .find_by_id(claims.sub)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        debug!("authenticated request for user {}", user.id);
        Ok(user.into())
    }
}

/// Development/test bypass: always resolves the identity it was constructed
/// with. Only ever installed explicitly at startup, never reachable from
/// request input.
pub struct FixedIdentityResolver {
    user: UserResponse,
}

impl FixedIdentityResolver {
    pub fn new(user: UserResponse) -> Self {
        Self { user }
    }
}

#[async_trait]
impl IdentityResolver for FixedIdentityResolver {
    async fn resolve(&self, _parts: &Parts) -> Result<UserResponse, AuthError> {
        Ok(self.user.clone())
    }
}

/// Pull a candidate token out of the Authorization header. Accepts
/// `Bearer <token>` with a case-insensitive scheme, or a bare token with no
/// scheme for compatibility with older clients.
fn bearer_token(parts: &Parts) -> Option<String> {
    let header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let mut words = header.split_whitespace();

    match (words.next(), words.next(), words.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => {
            Some(token.to_string())
        }
        (Some(token), None, None) => Some(token.to_string()),
        _ => None,
    }
}

/// Cookie fallback for browser clients that never set the header.
fn cookie_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(ACCESS_TOKEN_COOKIE)
        .map(|cookie| cookie.value().to_string())
}
