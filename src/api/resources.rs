//! Resource bindings for the painting schema
//!
//! Instantiates the generic CRUD handlers for `/models`, `/colors` and
//! `/painted_models`. The painted-model create response deviates on
//! purpose: it returns 204 with no body where the other two return 201
//! with the entity, preserving the service's observed contract.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};

use crate::api::crud::{resource_router, Resource};
use crate::api::middleware::AppState;
use crate::db::repositories::EntityStore;
use crate::models::{
    Color, ColorPatch, Model, ModelPatch, NewColor, NewModel, NewPaintedModel, PaintedModel,
    PaintedModelPatch,
};

/// `/models` resource
pub struct Models;

impl Resource for Models {
    type Entity = Model;
    type New = NewModel;
    type Patch = ModelPatch;

    const NAME: &'static str = "Model";

    fn store(
        state: &AppState,
    ) -> &dyn EntityStore<Entity = Model, New = NewModel, Patch = ModelPatch> {
        state.model_store.as_ref()
    }
}

/// `/colors` resource
pub struct Colors;

impl Resource for Colors {
    type Entity = Color;
    type New = NewColor;
    type Patch = ColorPatch;

    const NAME: &'static str = "Color";

    fn store(
        state: &AppState,
    ) -> &dyn EntityStore<Entity = Color, New = NewColor, Patch = ColorPatch> {
        state.color_store.as_ref()
    }
}

/// `/painted_models` resource
pub struct PaintedModels;

impl Resource for PaintedModels {
    type Entity = PaintedModel;
    type New = NewPaintedModel;
    type Patch = PaintedModelPatch;

    const NAME: &'static str = "Painted Model";

    fn store(
        state: &AppState,
    ) -> &dyn EntityStore<Entity = PaintedModel, New = NewPaintedModel, Patch = PaintedModelPatch>
    {
        state.painted_model_store.as_ref()
    }

    fn created_response(_entity: PaintedModel) -> Response {
        StatusCode::NO_CONTENT.into_response()
    }
}

/// Build the `/models` router
pub fn models_router() -> Router<AppState> {
    resource_router::<Models>()
}

/// Build the `/colors` router
pub fn colors_router() -> Router<AppState> {
    resource_router::<Colors>()
}

/// Build the `/painted_models` router
pub fn painted_models_router() -> Router<AppState> {
    resource_router::<PaintedModels>()
}
