//! Composite save-model endpoints
//!
//! - `POST /save-model` - create a model together with its paint job
//! - `PATCH /save-model/{id}` - update an existing model's paint job
//!
//! These two handlers own their response shapes: lowercase `error`/`message`
//! keys, and the update path echoes the underlying database error string in
//! its 500 body, which downstream tooling depends on.

use axum::{
    extract::rejection::JsonRejection,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthSession};
use crate::services::paint::{PaintError, PaintSpec, Repaint, SaveModelInput};

/// Request body for the create path
#[derive(Debug, Deserialize)]
pub struct SaveModelRequest {
    pub model_name: String,
    pub model_filepath: String,
    #[serde(default)]
    pub model_meshes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<ColorEntry>,
}

/// One color entry of the create path
#[derive(Debug, Deserialize)]
pub struct ColorEntry {
    pub color_hexcode: String,
    pub color_material: String,
}

/// Request body for the update path
#[derive(Debug, Deserialize)]
pub struct RepaintRequest {
    #[serde(default)]
    pub painted_models: Vec<RepaintEntry>,
}

/// One entry of the update path.
///
/// The wire format nests the material under `model.name`; the field name is
/// historical, the value is the material key.
#[derive(Debug, Deserialize)]
pub struct RepaintEntry {
    pub model: MaterialKey,
    pub color: HexcodeKey,
}

#[derive(Debug, Deserialize)]
pub struct MaterialKey {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct HexcodeKey {
    pub hexcode: String,
}

#[derive(Debug, Serialize)]
struct SaveMessage {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct RepaintError {
    error: String,
    message: &'static str,
}

/// POST /save-model - create a model with its paint job
///
/// The session is re-checked here through the `AuthSession` extractor even
/// though the gate already enforced it for this route.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthSession,
    body: Result<Json<SaveModelRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body.map_err(|_| ApiError::missing_fields())?;

    let input = SaveModelInput {
        name: body.model_name,
        filepath: body.model_filepath,
        meshes: body.model_meshes,
        colors: body
            .colors
            .into_iter()
            .map(|c| PaintSpec {
                hexcode: c.color_hexcode,
                material: c.color_material,
            })
            .collect(),
    };

    state
        .paint_service
        .save_new(auth.user_id, &input)
        .await
        .map_err(|e| {
            tracing::error!("Composite save failed: {}", e);
            ApiError::internal("Failed to save model")
        })?;

    Ok((
        StatusCode::CREATED,
        Json(SaveMessage {
            message: "Model and Colors saved successfully",
        }),
    ))
}

/// PATCH /save-model/{id} - update a model's paint job
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<RepaintRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(_) => return ApiError::missing_fields().into_response(),
    };

    let entries: Vec<Repaint> = body
        .painted_models
        .into_iter()
        .map(|entry| Repaint {
            material: entry.model.name,
            hexcode: entry.color.hexcode,
        })
        .collect();

    match state.paint_service.repaint(id, &entries).await {
        Ok(()) => (
            StatusCode::OK,
            Json(SaveMessage {
                message: "Model updated successfully",
            }),
        )
            .into_response(),
        Err(PaintError::ModelNotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "Model not found" })),
        )
            .into_response(),
        Err(PaintError::Database(e)) => {
            tracing::error!("Database error during repaint: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RepaintError {
                    error: e.to_string(),
                    message: "Database error occurred while updating the model",
                }),
            )
                .into_response()
        }
    }
}
