//! Connection pools
//!
//! Repositories receive a [`DynDatabasePool`] and pick their SQL by
//! [`DatabasePool::driver`]. SQLite is the default backend; MySQL is chosen
//! with `database.driver: mysql`.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    mysql::{MySqlPool, MySqlPoolOptions},
    sqlite::{SqlitePool, SqlitePoolOptions},
};
use std::path::Path;
use std::sync::Arc;

use crate::config::{DatabaseConfig, DatabaseDriver};

const SQLITE_MAX_CONNECTIONS: u32 = 20;
const MYSQL_MAX_CONNECTIONS: u32 = 30;

/// A connected database of either backend
#[async_trait]
pub trait DatabasePool: Send + Sync {
    fn driver(&self) -> DatabaseDriver;

    fn as_sqlite(&self) -> Option<&SqlitePool>;

    fn as_mysql(&self) -> Option<&MySqlPool>;

    /// Round trip to the server
    async fn ping(&self) -> Result<()>;

    /// Wait for open connections to finish and close them
    async fn close(&self);

    /// Like [`DatabasePool::as_sqlite`], failing when the driver differs
    fn sqlite(&self) -> Result<&SqlitePool> {
        self.as_sqlite().context("Database is not backed by SQLite")
    }

    /// Like [`DatabasePool::as_mysql`], failing when the driver differs
    fn mysql(&self) -> Result<&MySqlPool> {
        self.as_mysql().context("Database is not backed by MySQL")
    }
}

/// Shared handle to the database
pub type DynDatabasePool = Arc<dyn DatabasePool>;

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (creating if needed) the database at `url`
    ///
    /// Accepts a plain file path, a `sqlite:` URL or `:memory:`.
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = sqlite_connection_url(url);
        if let Some(dir) = sqlite_parent_dir(url) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database directory: {:?}", dir))?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(SQLITE_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        // Cascading deletes of comments rely on this
        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .context("Failed to enable foreign keys")?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for SqliteDatabase {
    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Sqlite
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        Some(&self.pool)
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        None
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("SQLite ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct MysqlDatabase {
    pool: MySqlPool,
}

impl MysqlDatabase {
    /// Connect to `url`, with or without the `mysql://` scheme
    pub async fn new(url: &str) -> Result<Self> {
        let connection_url = if url.starts_with("mysql://") {
            url.to_string()
        } else {
            format!("mysql://{}", url)
        };

        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(&connection_url)
            .await
            .with_context(|| format!("Failed to connect to MySQL database: {}", url))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl DatabasePool for MysqlDatabase {
    fn driver(&self) -> DatabaseDriver {
        DatabaseDriver::Mysql
    }

    fn as_sqlite(&self) -> Option<&SqlitePool> {
        None
    }

    fn as_mysql(&self) -> Option<&MySqlPool> {
        Some(&self.pool)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("MySQL ping failed")?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_sqlite_memory(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:")
}

/// sqlx URL for a configured SQLite location; files are created on demand
fn sqlite_connection_url(url: &str) -> String {
    if url == ":memory:" {
        "sqlite::memory:".to_string()
    } else if url.starts_with("sqlite:") {
        if url.contains('?') {
            url.to_string()
        } else {
            format!("{}?mode=rwc", url)
        }
    } else {
        format!("sqlite:{}?mode=rwc", url)
    }
}

/// Directory that has to exist before the database file can be created
fn sqlite_parent_dir(url: &str) -> Option<&Path> {
    if is_sqlite_memory(url) {
        return None;
    }
    let path = url.trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Connect to the configured database
pub async fn create_pool(config: &DatabaseConfig) -> Result<DynDatabasePool> {
    Ok(match config.driver {
        DatabaseDriver::Sqlite => Arc::new(SqliteDatabase::new(&config.url).await?),
        DatabaseDriver::Mysql => Arc::new(MysqlDatabase::new(&config.url).await?),
    })
}

/// In-memory SQLite database for tests
pub async fn create_test_pool() -> Result<DynDatabasePool> {
    create_pool(&DatabaseConfig {
        driver: DatabaseDriver::Sqlite,
        url: ":memory:".to_string(),
    })
    .await
}
