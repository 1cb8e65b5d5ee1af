// Authentication configuration loaded once at startup

use crate::auth::error::AuthError;

/// Signing secrets and expiry policy for the token service.
///
/// Access and refresh tokens are signed with distinct secrets so that
/// possessing one class of token never allows forging the other.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// Marks auth cookies `Secure` and switches SameSite to `None` for
    /// cross-site frontends served over TLS.
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Load the configuration from environment variables.
    ///
    /// `ACCESS_TOKEN_SECRET` and `REFRESH_TOKEN_SECRET` are required and must
    /// differ. TTLs default to 1 day for access tokens and 7 days for refresh
    /// tokens when `ACCESS_TOKEN_TTL_SECS` / `REFRESH_TOKEN_TTL_SECS` are
    /// unset.
    pub fn from_env() -> Result<Self, AuthError> {
        let access_secret = require_env("ACCESS_TOKEN_SECRET")?;
        let refresh_secret = require_env("REFRESH_TOKEN_SECRET")?;

        if access_secret == refresh_secret {
            return Err(AuthError::ConfigError(
                "ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must be distinct".to_string(),
            ));
        }

        Ok(Self {
            access_secret,
            refresh_secret,
            access_token_ttl_secs: env_secs("ACCESS_TOKEN_TTL_SECS", 86_400)?,
            refresh_token_ttl_secs: env_secs("REFRESH_TOKEN_TTL_SECS", 604_800)?,
            secure_cookies: std::env::var("COOKIE_SECURE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }
}

fn require_env(name: &str) -> Result<String, AuthError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AuthError::ConfigError(format!("{} must be set", name))),
    }
}

fn env_secs(name: &str, default: i64) -> Result<i64, AuthError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<i64>()
            .ok()
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                AuthError::ConfigError(format!("{} must be a positive number of seconds", name))
            }),
        Err(_) => Ok(default),
    }
}

/// Config used by unit and end-to-end tests; no environment involved.
#[cfg(test)]
pub(crate) fn test_config() -> AuthConfig {
    AuthConfig {
        access_secret: "access_secret_for_testing_purposes".to_string(),
        refresh_secret: "refresh_secret_for_testing_purposes".to_string(),
        access_token_ttl_secs: 900,
        refresh_token_ttl_secs: 604_800,
        secure_cookies: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_secrets_are_rejected() {
        std::env::set_var("ACCESS_TOKEN_SECRET", "same_secret");
        std::env::set_var("REFRESH_TOKEN_SECRET", "same_secret");

        let result = AuthConfig::from_env();
        assert!(matches!(result, Err(AuthError::ConfigError(_))));

        std::env::remove_var("ACCESS_TOKEN_SECRET");
        std::env::remove_var("REFRESH_TOKEN_SECRET");
    }

    #[test]
    fn test_defaults_applied() {
        let config = test_config();
        assert_eq!(config.access_token_ttl_secs, 900);
        assert_eq!(config.refresh_token_ttl_secs, 604_800);
        assert!(!config.secure_cookies);
    }
}
