// Authentication module
// Dual-token (access/refresh) sessions with rotation, revocation on logout,
// and a per-request authentication gate

pub mod config;
pub mod cookie;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repository;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use config::AuthConfig;
pub use error::AuthError;
pub use handlers::{login_handler, logout_handler, me_handler, refresh_handler, register_handler};
pub use middleware::{CurrentUser, FixedIdentityResolver, IdentityResolver, TokenIdentityResolver};
pub use models::{
    AuthResponse, LoginIdentifier, LoginRequest, RefreshRequest, RegisterRequest, StatusMessage,
    User, UserResponse,
};
pub use repository::{PgUserStore, UserStore};
pub use service::AuthService;
pub use token::TokenService;
