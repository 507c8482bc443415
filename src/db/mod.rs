//! Database layer
//!
//! Supports SQLite (the default, a single file next to the binary) and
//! MySQL, selected by `database.driver` in the configuration.
//!
//! # Usage
//!
//! ```ignore
//! use newsroom::config::DatabaseConfig;
//! use newsroom::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
