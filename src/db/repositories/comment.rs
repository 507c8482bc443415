//! Comment repository
//!
//! Database operations for comments. Comments are listed oldest first and
//! joined with their author's username for display.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Comment, CommentWithAuthor, CreateCommentInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Create a comment written by `author_id` at `created`
    async fn create(
        &self,
        input: &CreateCommentInput,
        author_id: i64,
        created: DateTime<Utc>,
    ) -> Result<Comment>;

    /// Get a comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a news item, oldest first
    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>>;

    /// Replace the text of a comment; returns false if it does not exist
    async fn update_text(&self, id: i64, text: &str) -> Result<bool>;

    /// Delete a comment; returns false if it does not exist
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Count all comments
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(
        &self,
        input: &CreateCommentInput,
        author_id: i64,
        created: DateTime<Utc>,
    ) -> Result<Comment> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_comment_sqlite(self.pool.sqlite()?, input, author_id, created).await
            }
            DatabaseDriver::Mysql => {
                create_comment_mysql(self.pool.mysql()?, input, author_id, created).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_comment_by_id_sqlite(self.pool.sqlite()?, id).await,
            DatabaseDriver::Mysql => get_comment_by_id_mysql(self.pool.mysql()?, id).await,
        }
    }

    async fn list_by_news(&self, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_by_news_sqlite(self.pool.sqlite()?, news_id).await,
            DatabaseDriver::Mysql => list_by_news_mysql(self.pool.mysql()?, news_id).await,
        }
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<bool> {
        let sql = "UPDATE comments SET text = ? WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(text)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to update comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(text)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to update comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM comments WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.sqlite()?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.mysql()?)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) as count FROM comments";
        let count = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .fetch_one(self.pool.sqlite()?)
                .await
                .context("Failed to count comments")?
                .get("count"),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .fetch_one(self.pool.mysql()?)
                .await
                .context("Failed to count comments")?
                .get("count"),
        };
        Ok(count)
    }
}

const INSERT_COMMENT_SQL: &str = r#"
    INSERT INTO comments (news_id, author_id, text, created)
    VALUES (?, ?, ?, ?)
"#;

const SELECT_COMMENT_SQL: &str = r#"
    SELECT id, news_id, author_id, text, created
    FROM comments
    WHERE id = ?
"#;

const LIST_BY_NEWS_SQL: &str = r#"
    SELECT c.id, c.news_id, c.author_id, c.text, c.created, u.username AS author_username
    FROM comments c
    JOIN users u ON u.id = c.author_id
    WHERE c.news_id = ?
    ORDER BY c.created ASC, c.id ASC
"#;

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(
    pool: &SqlitePool,
    input: &CreateCommentInput,
    author_id: i64,
    created: DateTime<Utc>,
) -> Result<Comment> {
    let result = sqlx::query(INSERT_COMMENT_SQL)
        .bind(input.news_id)
        .bind(author_id)
        .bind(&input.text)
        .bind(created)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        news_id: input.news_id,
        author_id,
        text: input.text.clone(),
        created,
    })
}

async fn get_comment_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(SELECT_COMMENT_SQL)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    Ok(row.as_ref().map(row_to_comment_sqlite))
}

async fn list_by_news_sqlite(pool: &SqlitePool, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_BY_NEWS_SQL)
        .bind(news_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: row_to_comment_sqlite(row),
            author_username: row.get("author_username"),
        })
        .collect())
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created: row.get("created"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(
    pool: &MySqlPool,
    input: &CreateCommentInput,
    author_id: i64,
    created: DateTime<Utc>,
) -> Result<Comment> {
    let result = sqlx::query(INSERT_COMMENT_SQL)
        .bind(input.news_id)
        .bind(author_id)
        .bind(&input.text)
        .bind(created)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_id() as i64,
        news_id: input.news_id,
        author_id,
        text: input.text.clone(),
        created,
    })
}

async fn get_comment_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Comment>> {
    let row = sqlx::query(SELECT_COMMENT_SQL)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    Ok(row.as_ref().map(row_to_comment_mysql))
}

async fn list_by_news_mysql(pool: &MySqlPool, news_id: i64) -> Result<Vec<CommentWithAuthor>> {
    let rows = sqlx::query(LIST_BY_NEWS_SQL)
        .bind(news_id)
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    Ok(rows
        .iter()
        .map(|row| CommentWithAuthor {
            comment: row_to_comment_mysql(row),
            author_username: row.get("author_username"),
        })
        .collect())
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Comment {
    Comment {
        id: row.get("id"),
        news_id: row.get("news_id"),
        author_id: row.get("author_id"),
        text: row.get("text"),
        created: row.get("created"),
    }
}
