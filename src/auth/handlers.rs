// HTTP handlers for authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::{
    cookie::{clear_auth_cookies, set_auth_cookies, REFRESH_TOKEN_COOKIE},
    error::AuthError,
    middleware::CurrentUser,
    models::{
        AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, StatusMessage, UserResponse,
    },
};
use crate::AppState;

/// Register a new user
/// POST /api/v1/users/register
#[utoipa::path(
    post,
    path = "/api/v1/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = String, example = json!({"error": "validation error"})),
        (status = 409, description = "Username or email already taken", body = String, example = json!({"error": "User already exists"}))
    ),
    tag = "auth"
)]
pub async fn register_handler(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    let user = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Login with username or email
/// POST /api/v1/users/login
///
/// Tokens are delivered both in the body and as HttpOnly cookies.
#[utoipa::path(
    post,
    path = "/api/v1/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session started", body = AuthResponse),
        (status = 401, description = "Bad credentials", body = String, example = json!({"error": "Access denied"}))
    ),
    tag = "auth"
)]
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    let auth = state.auth.login(request).await?;

    let tokens = state.auth.tokens();
    let jar = set_auth_cookies(
        jar,
        &auth.access_token,
        &auth.refresh_token,
        tokens.access_ttl_secs(),
        tokens.refresh_ttl_secs(),
        state.secure_cookies,
    );

    Ok((jar, Json(auth)))
}

/// End the current session
/// POST /api/v1/users/logout
#[utoipa::path(
    post,
    path = "/api/v1/users/logout",
    responses(
        (status = 200, description = "Session ended", body = StatusMessage),
        (status = 401, description = "Not authenticated", body = String, example = json!({"error": "Access denied"}))
    ),
    tag = "auth"
)]
pub async fn logout_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: CookieJar,
) -> Result<(CookieJar, Json<StatusMessage>), AuthError> {
    state.auth.logout(user.id).await?;

    Ok((
        clear_auth_cookies(jar),
        Json(StatusMessage {
            message: "Logged out successfully".to_string(),
        }),
    ))
}

/// Rotate the token pair
/// POST /api/v1/users/refresh-token
///
/// The refresh token is read from the JSON body when present, otherwise from
/// the `refreshToken` cookie.
#[utoipa::path(
    post,
    path = "/api/v1/users/refresh-token",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Token pair rotated", body = AuthResponse),
        (status = 401, description = "Missing, invalid or reused refresh token", body = String, example = json!({"error": "Access denied"}))
    ),
    tag = "auth"
)]
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshRequest>>,
) -> Result<(CookieJar, Json<AuthResponse>), AuthError> {
    let presented = body
        .and_then(|Json(request)| request.refresh_token)
        .or_else(|| {
            jar.get(REFRESH_TOKEN_COOKIE)
                .map(|cookie| cookie.value().to_string())
        });

    let auth = state.auth.refresh(presented.as_deref()).await?;

    let tokens = state.auth.tokens();
    let jar = set_auth_cookies(
        jar,
        &auth.access_token,
        &auth.refresh_token,
        tokens.access_ttl_secs(),
        tokens.refresh_ttl_secs(),
        state.secure_cookies,
    );

    Ok((jar, Json(auth)))
}

/// Current identity, minus secrets
/// GET /api/v1/users/me
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Authenticated profile", body = UserResponse),
        (status = 401, description = "Not authenticated", body = String, example = json!({"error": "Access denied"}))
    ),
    tag = "auth"
)]
pub async fn me_handler(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user)
}
