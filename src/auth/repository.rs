// Credential store: user records and the persisted refresh token

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{
    error::AuthError,
    models::{LoginIdentifier, NewUser, User},
};

/// Hash a token with SHA-256 before it touches storage. A leaked users table
/// must not yield replayable refresh tokens.
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Storage contract consumed by the auth core.
///
/// The refresh-token field is the only shared mutable state in the subsystem,
/// so `swap_refresh_token` must be an atomic compare-and-swap: two concurrent
/// rotations presenting the same token must resolve to exactly one winner.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError>;

    async fn find_by_identifier(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Unconditionally set or clear the persisted refresh token.
    /// Clearing for an unknown id is a no-op, which keeps logout idempotent.
    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AuthError>;

    /// Replace the persisted refresh token only if the currently stored value
    /// matches `presented`. Returns whether the swap happened.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AuthError>;
}

const USER_COLUMNS: &str = "id, username, email, full_name, password_hash, \
                            avatar_url, cover_image_url, refresh_token_hash, created_at";

/// Postgres-backed user store
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
        let query = format!(
            "INSERT INTO users (username, email, full_name, password_hash, avatar_url, cover_image_url) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.full_name)
            .bind(&new_user.password_hash)
            .bind(&new_user.avatar_url)
            .bind(&new_user.cover_image_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return AuthError::UserAlreadyExists;
                    }
                }
                AuthError::DatabaseError(e.to_string())
            })
    }

    async fn find_by_identifier(
        &self,
        identifier: &LoginIdentifier,
    ) -> Result<Option<User>, AuthError> {
        // Values arrive normalized; columns are stored normalized.
        let query = match identifier {
            LoginIdentifier::ByUsername(_) => {
                format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1")
            }
            LoginIdentifier::ByEmail(_) => {
                format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1")
            }
        };

        let user = sqlx::query_as::<_, User>(&query)
            .bind(identifier.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET refresh_token_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(token.map(hash_token))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AuthError> {
        // Single-statement compare-and-swap; the row lock makes concurrent
        // rotations of the same token resolve to one winner.
        let result = sqlx::query(
            "UPDATE users SET refresh_token_hash = $3 \
             WHERE id = $1 AND refresh_token_hash = $2",
        )
        .bind(id)
        .bind(hash_token(presented))
        .bind(hash_token(replacement))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// In-memory store with the same CAS semantics, for tests.
#[cfg(test)]
pub mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    #[derive(Default)]
    pub struct MemoryUserStore {
        users: Mutex<HashMap<Uuid, User>>,
    }

    impl MemoryUserStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn create_user(&self, new_user: NewUser) -> Result<User, AuthError> {
            let mut users = self.users.lock().unwrap();

            let taken = users
                .values()
                .any(|u| u.username == new_user.username || u.email == new_user.email);
            if taken {
                return Err(AuthError::UserAlreadyExists);
            }

            let user = User {
                id: Uuid::new_v4(),
                username: new_user.username,
                email: new_user.email,
                full_name: new_user.full_name,
                password_hash: new_user.password_hash,
                avatar_url: new_user.avatar_url,
                cover_image_url: new_user.cover_image_url,
                refresh_token_hash: None,
                created_at: Utc::now(),
            };
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_by_identifier(
            &self,
            identifier: &LoginIdentifier,
        ) -> Result<Option<User>, AuthError> {
            let users = self.users.lock().unwrap();
            let found = users
                .values()
                .find(|u| match identifier {
                    LoginIdentifier::ByUsername(name) => &u.username == name,
                    LoginIdentifier::ByEmail(email) => &u.email == email,
                })
                .cloned();
            Ok(found)
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn set_refresh_token(&self, id: Uuid, token: Option<&str>) -> Result<(), AuthError> {
            if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
                user.refresh_token_hash = token.map(hash_token);
            }
            Ok(())
        }

        async fn swap_refresh_token(
            &self,
            id: Uuid,
            presented: &str,
            replacement: &str,
        ) -> Result<bool, AuthError> {
            let mut users = self.users.lock().unwrap();
            match users.get_mut(&id) {
                Some(user) if user.refresh_token_hash.as_deref() == Some(&hash_token(presented)) => {
                    user.refresh_token_hash = Some(hash_token(replacement));
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }
}
