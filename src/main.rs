//! Paintbox - a session-authenticated backend for painting 3D models

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use paintbox::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxColorRepository, SqlxModelRepository, SqlxPaintedModelRepository,
            SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{AuthService, PaintService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paintbox=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Paintbox...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let model_store = SqlxModelRepository::boxed(pool.clone());
    let color_store = SqlxColorRepository::boxed(pool.clone());
    let painted_model_store = SqlxPaintedModelRepository::boxed(pool.clone());

    // Initialize services
    let auth_service = Arc::new(AuthService::with_session_expiration(
        user_repo.clone(),
        session_repo,
        config.session.expiration_days,
    ));
    let paint_service = Arc::new(PaintService::new(pool.clone()));

    // Sweep expired sessions left over from previous runs
    match auth_service.cleanup_expired_sessions().await {
        Ok(0) => {}
        Ok(count) => tracing::info!("Removed {} expired session(s)", count),
        Err(e) => tracing::warn!("Failed to clean up expired sessions: {}", e),
    }

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        auth_service,
        paint_service,
        user_repo,
        model_store,
        color_store,
        painted_model_store,
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
