//! Data models
//!
//! Entity structs for the painting schema plus the create/patch input types
//! consumed by the CRUD layer. Patch types double as the allow-list of
//! externally writable columns: unknown keys are rejected at
//! deserialization time.

mod color;
mod model;
mod painted_model;
mod session;
mod user;

pub use color::{Color, ColorPatch, NewColor};
pub use model::{Model, ModelPatch, NewModel};
pub use painted_model::{NewPaintedModel, PaintedModel, PaintedModelPatch};
pub use session::Session;
pub use user::User;
