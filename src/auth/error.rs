// Authentication error types
//
// Every credential failure is distinguished internally so logs and tests can
// tell the stages apart, but all of them collapse to one generic 401 body at
// the HTTP boundary. Distinct messages per stage would hand attackers an
// account-enumeration and token-guessing oracle.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Uniform body returned for every credential failure.
pub const ACCESS_DENIED: &str = "Access denied";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("username or email already registered")]
    UserAlreadyExists,

    // Credential failures. All map to a generic 401 externally.
    #[error("missing authentication token")]
    MissingToken,
    #[error("malformed token")]
    MalformedToken,
    #[error("token has expired")]
    ExpiredToken,
    #[error("token signature mismatch")]
    SignatureMismatch,
    #[error("refresh token is stale or already rotated")]
    StaleRefreshToken,
    #[error("user not found")]
    UserNotFound,
    #[error("invalid password")]
    InvalidPassword,

    // Server-side failures, surfaced as 500s.
    #[error("password hashing error")]
    PasswordHashError,
    #[error("token generation error: {0}")]
    TokenGenerationError(String),
    #[error("database error: {0}")]
    DatabaseError(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl AuthError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AuthError::UserAlreadyExists => StatusCode::CONFLICT,
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::SignatureMismatch
            | AuthError::StaleRefreshToken
            | AuthError::UserNotFound
            | AuthError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_)
            | AuthError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Never reveals which authentication stage failed
    /// and never carries server internals.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::ValidationError(msg) => msg.clone(),
            AuthError::UserAlreadyExists => "User already exists".to_string(),
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::SignatureMismatch
            | AuthError::StaleRefreshToken
            | AuthError::UserNotFound
            | AuthError::InvalidPassword => ACCESS_DENIED.to_string(),
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_)
            | AuthError::ConfigError(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            AuthError::ValidationError(msg) => {
                warn!("request validation failed: {}", msg);
            }
            AuthError::UserAlreadyExists => {
                warn!("registration rejected: duplicate username or email");
            }
            AuthError::MissingToken
            | AuthError::MalformedToken
            | AuthError::ExpiredToken
            | AuthError::SignatureMismatch
            | AuthError::StaleRefreshToken
            | AuthError::UserNotFound
            | AuthError::InvalidPassword => {
                // The specific stage is logged here and nowhere else.
                warn!("authentication rejected: {}", self);
            }
            AuthError::PasswordHashError
            | AuthError::TokenGenerationError(_)
            | AuthError::DatabaseError(_)
            | AuthError::ConfigError(_) => {
                error!("auth subsystem failure: {}", self);
            }
        }

        let body = Json(json!({
            "error": self.client_message(),
        }));

        (status, body).into_response()
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(errors.to_string())
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        AuthError::DatabaseError(error.to_string())
    }
}
