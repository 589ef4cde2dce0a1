//! Authentication API endpoints
//!
//! - `POST /signup` - create an account and open a session
//! - `POST /login` - authenticate and open a session
//! - `DELETE /logout` - close the current session
//! - `GET /checksession` - resolve the current session to its account

use axum::{
    extract::rejection::JsonRejection,
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthSession};
use crate::models::User;
use crate::services::auth::{AuthError, LoginInput, SignupInput};

/// Session cookie lifetime; matches the default server-side expiration
const COOKIE_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

/// Request body for signup and login
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

/// Public projection of a user: id and username, nothing else
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
        }
    }
}

fn session_cookie(token: &str) -> HeaderMap {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token, COOKIE_MAX_AGE_SECS
    );

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers
}

fn clear_session_cookie() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    );
    headers
}

/// POST /signup - create an account
///
/// Missing keys and duplicate usernames both map to 422, mirroring the
/// service's observed contract.
pub async fn signup(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::unprocessable("Missing required fields"))?;

    let (user, session) = state
        .auth_service
        .signup(SignupInput {
            username: body.username,
            password: body.password,
        })
        .await
        .map_err(|e| match e {
            AuthError::UsernameTaken => ApiError::unprocessable("Username already exists"),
            _ => {
                tracing::error!("Signup failed: {}", e);
                ApiError::internal("Failed to create user")
            }
        })?;

    Ok((
        StatusCode::CREATED,
        session_cookie(&session.id),
        Json(UserResponse::from(user)),
    ))
}

/// POST /login - authenticate
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::missing_fields())?;

    let (user, session) = state
        .auth_service
        .login(LoginInput {
            username: body.username,
            password: body.password,
        })
        .await
        .map_err(|e| match e {
            AuthError::InvalidCredentials => ApiError::invalid_credentials(),
            _ => {
                tracing::error!("Login failed: {}", e);
                ApiError::internal("Failed to log in")
            }
        })?;

    Ok((session_cookie(&session.id), Json(UserResponse::from(user))))
}

/// DELETE /logout - close the current session
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<impl IntoResponse, ApiError> {
    state.auth_service.logout(&auth.token).await.map_err(|e| {
        tracing::error!("Logout failed: {}", e);
        ApiError::internal("Failed to log out")
    })?;

    Ok((StatusCode::NO_CONTENT, clear_session_cookie()))
}

/// GET /checksession - resolve the current session
///
/// The gate already proved the session itself; this still returns 404 when
/// the account behind it no longer exists.
pub async fn check_session(
    State(state): State<AppState>,
    auth: AuthSession,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .auth_service
        .user_by_id(auth.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Session lookup failed: {}", e);
            ApiError::internal("Failed to check session")
        })?
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "User session not found"))?;

    Ok(Json(UserResponse::from(user)))
}
