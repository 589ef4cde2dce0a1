//! API layer - HTTP handlers and routing
//!
//! Route map:
//! - `POST /signup`, `POST /login` - public
//! - everything else behind the session gate:
//!   `GET /checksession`, `DELETE /logout`, the three resource routers
//!   (`/models`, `/colors`, `/painted_models`) and the composite
//!   `/save-model` endpoints.

pub mod auth;
pub mod crud;
pub mod middleware;
pub mod resources;
pub mod save_model;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthSession};

/// Build the API router: public auth routes plus the gated remainder.
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/checksession", get(auth::check_session))
        .route("/logout", delete(auth::logout))
        .nest("/models", resources::models_router())
        .nest("/colors", resources::colors_router())
        .nest("/painted_models", resources::painted_models_router())
        .route("/save-model", post(save_model::create))
        .route("/save-model/{id}", patch(save_model::update))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_session,
        ));

    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(protected)
}

/// Build the complete router with CORS and tracing layers.
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // Credentials must be allowed for the session cookie to travel
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .merge(build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
