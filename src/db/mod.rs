//! Database layer
//!
//! Provides the connection pool abstraction (SQLite by default, MySQL for
//! larger deployments), embedded migrations, and the repository
//! implementations. The driver is selected from configuration; everything
//! above this layer works against `DynDatabasePool` and the repository
//! traits without knowing the backend.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
