//! API middleware
//!
//! Contains the shared application state, the session gate that fronts
//! every protected route, and the `ApiError` type that turns failures into
//! the service's `{"Error": ...}` JSON bodies.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::db::repositories::{DynEntityStore, UserRepository};
use crate::db::DynDatabasePool;
use crate::models::{Color, ColorPatch, Model, ModelPatch, NewColor, NewModel, NewPaintedModel, PaintedModel, PaintedModelPatch};
use crate::services::{AuthService, PaintService};

/// Application state containing shared services and stores
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub auth_service: Arc<AuthService>,
    pub paint_service: Arc<PaintService>,
    pub user_repo: Arc<dyn UserRepository>,
    pub model_store: DynEntityStore<Model, NewModel, ModelPatch>,
    pub color_store: DynEntityStore<Color, NewColor, ColorPatch>,
    pub painted_model_store: DynEntityStore<PaintedModel, NewPaintedModel, PaintedModelPatch>,
}

/// Authenticated session extracted by the gate middleware.
///
/// Carries the session's user id and the raw token (needed by logout). The
/// gate does not touch the users table; handlers that need the account load
/// it themselves.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: i64,
    pub token: String,
}

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Present on every route behind require_session; absence means a
        // handler was wired without the gate
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or_else(ApiError::not_authenticated)
    }
}

/// Error response carrying a status code and the JSON error body
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "Error")]
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// 401 for requests that did not pass the session gate
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized")
    }

    /// 401 for the save-model handler's own session check
    pub fn not_authenticated() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "User not authenticated")
    }

    /// 401 for failed logins; one message for both unknown username and
    /// wrong password
    pub fn invalid_credentials() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Invalid username or password")
    }

    /// 400 for create bodies missing required keys
    pub fn missing_fields() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Missing required fields")
    }

    /// 400 for patch bodies with unknown or ill-typed keys
    pub fn invalid_fields() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Invalid fields")
    }

    /// 422 variant used by signup
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    /// 404 with the entity name, e.g. "Model not found"
    pub fn not_found(entity: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, format!("{} not found", entity))
    }

    /// 500 with a short, sanitized message
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Extract the session token from the request.
///
/// The cookie is the primary carrier; a bearer token is accepted for
/// non-browser clients.
fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    return Some(token.to_string());
                }
            }
        }
    }

    None
}

/// Session gate middleware.
///
/// Runs before every route except signup and login. A missing, unknown or
/// expired token short-circuits with 401 and the handler never executes.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = match extract_session_token(&request) {
        Some(token) => token,
        None => {
            tracing::debug!(path = %request.uri().path(), "Unauthorized: no session token");
            return Err(ApiError::unauthorized());
        }
    };

    let session = state
        .auth_service
        .resolve_session(&token)
        .await
        .map_err(|e| {
            tracing::error!("Session validation failed: {}", e);
            ApiError::internal("Session validation failed")
        })?
        .ok_or_else(ApiError::unauthorized)?;

    request.extensions_mut().insert(AuthSession {
        user_id: session.user_id,
        token,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(name: header::HeaderName, value: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(name, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_token_from_cookie() {
        let request = request_with_header(header::COOKIE, "session=token-123; theme=dark");
        assert_eq!(
            extract_session_token(&request),
            Some("token-123".to_string())
        );
    }

    #[test]
    fn test_extract_token_from_bearer() {
        let request = request_with_header(header::AUTHORIZATION, "Bearer token-456");
        assert_eq!(
            extract_session_token(&request),
            Some("token-456".to_string())
        );
    }

    #[test]
    fn test_bearer_takes_priority_over_cookie() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(
            extract_session_token(&request),
            Some("bearer-token".to_string())
        );
    }

    #[test]
    fn test_extract_token_none() {
        let request = Request::builder()
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_extract_token_ignores_other_schemes() {
        let request = request_with_header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz");
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_api_error_bodies() {
        assert_eq!(ApiError::unauthorized().message, "Unauthorized");
        assert_eq!(ApiError::unauthorized().status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::not_found("Painted Model").message,
            "Painted Model not found"
        );
        assert_eq!(
            ApiError::missing_fields().status,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::unprocessable("Username already exists").status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
