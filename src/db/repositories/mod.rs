//! Database repositories
//!
//! Repository pattern implementations for database access. Users and
//! sessions get dedicated traits; the three painting resources (models,
//! colors, painted model associations) share the generic `EntityStore`
//! contract so the HTTP layer can drive them through one parametrized set
//! of CRUD handlers.

pub mod color;
pub mod model;
pub mod painted_model;
pub mod session;
pub mod user;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub use color::SqlxColorRepository;
pub use model::SqlxModelRepository;
pub use painted_model::SqlxPaintedModelRepository;
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

/// Uniform CRUD contract over one entity table.
///
/// `update` applies a partial patch to an existing row and returns the
/// updated entity, or `None` when the id does not exist; `delete` reports
/// whether a row was actually removed.
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Entity: Send + Sync;
    type New: Send + Sync;
    type Patch: Send + Sync;

    /// List the full collection
    async fn list(&self) -> Result<Vec<Self::Entity>>;

    /// Get one entity by ID
    async fn get(&self, id: i64) -> Result<Option<Self::Entity>>;

    /// Insert a new entity and return it with its assigned ID
    async fn insert(&self, new: &Self::New) -> Result<Self::Entity>;

    /// Apply a partial patch to an entity
    async fn update(&self, id: i64, patch: &Self::Patch) -> Result<Option<Self::Entity>>;

    /// Delete an entity; returns false if the ID did not exist
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Shared handle to an entity store
pub type DynEntityStore<E, N, P> = Arc<dyn EntityStore<Entity = E, New = N, Patch = P>>;
