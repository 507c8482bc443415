//! News repository
//!
//! Database operations for news items.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateNewsInput, News, NewsWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Create a news item
    async fn create(&self, input: &CreateNewsInput) -> Result<News>;

    /// Get a news item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<News>>;

    /// Freshest news first (date, then id, descending), at most `limit` items
    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsWithCount>>;

    /// Count all news items
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based news repository implementation
pub struct SqlxNewsRepository {
    pool: DynDatabasePool,
}

impl SqlxNewsRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn NewsRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, input: &CreateNewsInput) -> Result<News> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => create_news_sqlite(self.pool.sqlite()?, input).await,
            DatabaseDriver::Mysql => create_news_mysql(self.pool.mysql()?, input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<News>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_news_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_news_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_latest(&self, limit: i64) -> Result<Vec<NewsWithCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_latest_sqlite(self.pool.sqlite()?, limit).await,
            DatabaseDriver::Mysql => list_latest_mysql(self.pool.mysql()?, limit).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_news_sqlite(self.pool.sqlite()?).await,
            DatabaseDriver::Mysql => count_news_mysql(self.pool.mysql()?).await,
        }
    }
}

const LIST_LATEST_SQL: &str = r#"
    SELECT n.id, n.title, n.text, n.date,
           (SELECT COUNT(*) FROM comments c WHERE c.news_id = n.id) AS comment_count
    FROM news n
    ORDER BY n.date DESC, n.id DESC
    LIMIT ?
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_news_sqlite(pool: &SqlitePool, input: &CreateNewsInput) -> Result<News> {
    let date = input.resolved_date();

    let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.text)
        .bind(date)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_rowid(),
        title: input.title.clone(),
        text: input.text.clone(),
        date,
    })
}

async fn get_news_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.as_ref().map(row_to_news_sqlite))
}

async fn list_latest_sqlite(pool: &SqlitePool, limit: i64) -> Result<Vec<NewsWithCount>> {
    let rows = sqlx::query(LIST_LATEST_SQL)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list latest news")?;

    Ok(rows
        .iter()
        .map(|row| NewsWithCount {
            news: row_to_news_sqlite(row),
            comment_count: row.get("comment_count"),
        })
        .collect())
}

async fn count_news_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news")
        .fetch_one(pool)
        .await
        .context("Failed to count news")?;

    Ok(row.get("count"))
}

fn row_to_news_sqlite(row: &sqlx::sqlite::SqliteRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_news_mysql(pool: &MySqlPool, input: &CreateNewsInput) -> Result<News> {
    let date = input.resolved_date();

    let result = sqlx::query("INSERT INTO news (title, text, date) VALUES (?, ?, ?)")
        .bind(&input.title)
        .bind(&input.text)
        .bind(date)
        .execute(pool)
        .await
        .context("Failed to create news")?;

    Ok(News {
        id: result.last_insert_id() as i64,
        title: input.title.clone(),
        text: input.text.clone(),
        date,
    })
}

async fn get_news_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<News>> {
    let row = sqlx::query("SELECT id, title, text, date FROM news WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get news by ID")?;

    Ok(row.as_ref().map(row_to_news_mysql))
}

async fn list_latest_mysql(pool: &MySqlPool, limit: i64) -> Result<Vec<NewsWithCount>> {
    let rows = sqlx::query(LIST_LATEST_SQL)
        .bind(limit)
        .fetch_all(pool)
        .await
        .context("Failed to list latest news")?;

    Ok(rows
        .iter()
        .map(|row| NewsWithCount {
            news: row_to_news_mysql(row),
            comment_count: row.get("comment_count"),
        })
        .collect())
}

async fn count_news_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM news")
        .fetch_one(pool)
        .await
        .context("Failed to count news")?;

    Ok(row.get("count"))
}

fn row_to_news_mysql(row: &sqlx::mysql::MySqlRow) -> News {
    News {
        id: row.get("id"),
        title: row.get("title"),
        text: row.get("text"),
        date: row.get("date"),
    }
}
