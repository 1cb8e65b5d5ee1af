// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// User database model.
///
/// `username` and `email` are stored trimmed and lowercased; uniqueness is
/// enforced by the store. `refresh_token_hash` holds the SHA-256 digest of
/// the single active refresh token, or `None` when logged out. Only the auth
/// core mutates the password and refresh-token fields.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User response model (excludes password_hash and refresh_token_hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar_url: user.avatar_url,
            cover_image_url: user.cover_image_url,
            created_at: user.created_at,
        }
    }
}

/// Fields required to insert a new user. Username and email are expected to
/// be normalized already.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub cover_image_url: Option<String>,
}

/// Login lookup key, resolved exactly once from the raw request input.
///
/// The inner value is normalized (trimmed, lowercased) so stores can compare
/// against their normalized columns directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    ByUsername(String),
    ByEmail(String),
}

impl LoginIdentifier {
    /// Resolve an identifier from optional raw inputs, preferring the
    /// username when both are supplied. Returns `None` when neither field
    /// carries a usable value.
    pub fn resolve(username: Option<&str>, email: Option<&str>) -> Option<Self> {
        if let Some(raw) = username {
            let normalized = raw.trim().to_lowercase();
            if !normalized.is_empty() {
                return Some(LoginIdentifier::ByUsername(normalized));
            }
        }
        if let Some(raw) = email {
            let normalized = raw.trim().to_lowercase();
            if !normalized.is_empty() {
                return Some(LoginIdentifier::ByEmail(normalized));
            }
        }
        None
    }

    pub fn value(&self) -> &str {
        match self {
            LoginIdentifier::ByUsername(v) | LoginIdentifier::ByEmail(v) => v,
        }
    }
}

/// Registration request DTO
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 32))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub full_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[validate(url)]
    pub cover_image_url: Option<String>,
}

/// Login request DTO. Either `username` or `email` must be present.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

/// Token refresh request DTO. The token may instead arrive via the
/// `refreshToken` cookie, so the body field is optional.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// Authentication response DTO
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Plain status message body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_prefers_username() {
        let ident = LoginIdentifier::resolve(Some("  Alice "), Some("alice@example.com"));
        assert_eq!(ident, Some(LoginIdentifier::ByUsername("alice".to_string())));
    }

    #[test]
    fn test_identifier_falls_back_to_email() {
        let ident = LoginIdentifier::resolve(None, Some(" Alice@Example.COM "));
        assert_eq!(
            ident,
            Some(LoginIdentifier::ByEmail("alice@example.com".to_string()))
        );
    }

    #[test]
    fn test_blank_inputs_resolve_to_none() {
        assert_eq!(LoginIdentifier::resolve(Some("   "), Some("")), None);
        assert_eq!(LoginIdentifier::resolve(None, None), None);
    }

    #[test]
    fn test_user_response_strips_secrets() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            full_name: "Alice Doe".to_string(),
            password_hash: "$argon2id$...".to_string(),
            avatar_url: None,
            cover_image_url: None,
            refresh_token_hash: Some("deadbeef".to_string()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("refresh_token_hash").is_none());
        assert_eq!(json["username"], "alice");
    }
}
