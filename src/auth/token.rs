// JWT issuance and verification

use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::{config::AuthConfig, error::AuthError};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Identity id of the subject
    pub sub: Uuid,
    /// Issued-at timestamp (unix seconds)
    pub iat: i64,
    /// Expiration timestamp (unix seconds)
    pub exp: i64,
}

/// Token service for the dual-token scheme.
///
/// Access and refresh tokens use distinct signing secrets and expiry
/// durations; a token of one class never verifies against the other. All
/// operations are pure: nothing here touches storage.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Generate a short-lived access token
    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        issue(user_id, &self.access_secret, self.access_ttl_secs)
    }

    /// Generate a long-lived refresh token
    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        issue(user_id, &self.refresh_secret, self.refresh_ttl_secs)
    }

    /// Generate an access/refresh pair for the same subject
    pub fn issue_token_pair(&self, user_id: Uuid) -> Result<(String, String), AuthError> {
        Ok((
            self.issue_access_token(user_id)?,
            self.issue_refresh_token(user_id)?,
        ))
    }

    /// Verify an access token's signature and expiry
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.access_secret)
    }

    /// Verify a refresh token's signature and expiry
    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.refresh_secret)
    }
}

fn issue(user_id: Uuid, secret: &str, ttl_secs: i64) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id,
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::TokenGenerationError(e.to_string()))
}

fn verify(token: &str, secret: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
        ErrorKind::InvalidSignature => AuthError::SignatureMismatch,
        _ => AuthError::MalformedToken,
    })
}
