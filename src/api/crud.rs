//! Generic resource CRUD
//!
//! One parametrized set of handlers drives all three painting resources.
//! A `Resource` binding ties together the entity type, its create/patch
//! bodies, the store in `AppState`, and the entity name used in error
//! messages; `resource_router` instantiates the full route set for it.
//!
//! Contract per resource:
//! - `GET /` lists the whole collection (200)
//! - `POST /` creates from a full body: 201 with the entity unless the
//!   resource overrides `created_response`, 400 on missing keys
//! - `GET /{id}` fetches one (200 / 404)
//! - `PATCH /{id}` applies an allow-listed partial overwrite: 202 with the
//!   updated entity, 400 on unknown keys
//! - `DELETE /{id}` removes one (204 / 404)

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::api::middleware::{ApiError, AppState};
use crate::db::repositories::EntityStore;

/// Binding between a resource's types and its slot in `AppState`.
pub trait Resource: Send + Sync + 'static {
    type Entity: Serialize + Send + Sync;
    type New: DeserializeOwned + Send + Sync;
    type Patch: DeserializeOwned + Send + Sync;

    /// Entity name as it appears in error messages, e.g. "Painted Model"
    const NAME: &'static str;

    /// The resource's store in the application state
    fn store(
        state: &AppState,
    ) -> &dyn EntityStore<Entity = Self::Entity, New = Self::New, Patch = Self::Patch>;

    /// Response for a successful create; 201 with the entity by default
    fn created_response(entity: Self::Entity) -> Response {
        (StatusCode::CREATED, Json(entity)).into_response()
    }
}

/// Build the router for one resource.
pub fn resource_router<R: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route(
            "/{id}",
            get(get_one::<R>).patch(update::<R>).delete(delete::<R>),
        )
}

async fn list<R: Resource>(
    State(state): State<AppState>,
) -> Result<Json<Vec<R::Entity>>, ApiError> {
    let entities = R::store(&state).list().await.map_err(|e| {
        tracing::error!("Failed to list {}: {}", R::NAME, e);
        ApiError::internal(format!("Failed to list {}", R::NAME.to_lowercase()))
    })?;

    Ok(Json(entities))
}

async fn create<R: Resource>(
    State(state): State<AppState>,
    body: Result<Json<R::New>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::missing_fields())?;

    let entity = R::store(&state).insert(&body).await.map_err(|e| {
        tracing::error!("Failed to create {}: {}", R::NAME, e);
        ApiError::internal(format!("Failed to create {}", R::NAME.to_lowercase()))
    })?;

    Ok(R::created_response(entity))
}

async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<R::Entity>, ApiError> {
    let entity = R::store(&state)
        .get(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get {} {}: {}", R::NAME, id, e);
            ApiError::internal(format!("Failed to get {}", R::NAME.to_lowercase()))
        })?
        .ok_or_else(|| ApiError::not_found(R::NAME))?;

    Ok(Json(entity))
}

async fn update<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<R::Patch>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(patch) = body.map_err(|_| ApiError::invalid_fields())?;

    let entity = R::store(&state)
        .update(id, &patch)
        .await
        .map_err(|e| {
            tracing::error!("Failed to update {} {}: {}", R::NAME, id, e);
            ApiError::internal(format!("Failed to update {}", R::NAME.to_lowercase()))
        })?
        .ok_or_else(|| ApiError::not_found(R::NAME))?;

    Ok((StatusCode::ACCEPTED, Json(entity)))
}

async fn delete<R: Resource>(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let deleted = R::store(&state).delete(id).await.map_err(|e| {
        tracing::error!("Failed to delete {} {}: {}", R::NAME, id, e);
        ApiError::internal(format!("Failed to delete {}", R::NAME.to_lowercase()))
    })?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(R::NAME))
    }
}
