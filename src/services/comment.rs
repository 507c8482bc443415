//! Comment service
//!
//! Comments are written by signed-in users only. Editing and deleting go
//! through [`CommentService::get_owned`], which reports another user's
//! comment as not found so its existence is not revealed.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::forms::{BannedWords, CommentForm};
use crate::models::{Comment, CreateCommentInput, User};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for comment service operations
#[derive(Debug, thiserror::Error)]
pub enum CommentServiceError {
    /// The news item to comment on does not exist
    #[error("News not found: {0}")]
    NewsNotFound(i64),

    /// Comment missing, or owned by another user
    #[error("Comment not found: {0}")]
    NotFound(i64),

    /// The submitted form has errors; they are recorded on the form
    #[error("Invalid comment")]
    InvalidForm,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Comment service
pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
    banned_words: BannedWords,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        news_repo: Arc<dyn NewsRepository>,
        banned_words: BannedWords,
    ) -> Self {
        Self {
            comment_repo,
            news_repo,
            banned_words,
        }
    }

    pub fn banned_words(&self) -> &BannedWords {
        &self.banned_words
    }

    /// Add a comment by `author` to a news item
    ///
    /// Nothing is written when the form is invalid; the errors stay on `form`.
    pub async fn create(
        &self,
        news_id: i64,
        author: &User,
        form: &mut CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        if self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news")?
            .is_none()
        {
            return Err(CommentServiceError::NewsNotFound(news_id));
        }

        if !form.validate(&self.banned_words) {
            return Err(CommentServiceError::InvalidForm);
        }

        let input = CreateCommentInput {
            news_id,
            text: form.text.clone(),
        };
        let comment = self
            .comment_repo
            .create(&input, author.id, Utc::now())
            .await
            .context("Failed to create comment")?;

        tracing::info!(
            "User {} commented on news {} (comment {})",
            author.id,
            news_id,
            comment.id
        );
        Ok(comment)
    }

    /// A comment written by `user`
    pub async fn get_owned(&self, comment_id: i64, user: &User) -> Result<Comment, CommentServiceError> {
        let comment = self
            .comment_repo
            .get_by_id(comment_id)
            .await
            .context("Failed to get comment")?
            .filter(|c| user.is_author_of(c.author_id))
            .ok_or(CommentServiceError::NotFound(comment_id))?;

        Ok(comment)
    }

    /// Replace the text of the user's own comment; author and news stay as they are
    pub async fn update(
        &self,
        comment_id: i64,
        user: &User,
        form: &mut CommentForm,
    ) -> Result<Comment, CommentServiceError> {
        let mut comment = self.get_owned(comment_id, user).await?;

        if !form.validate(&self.banned_words) {
            return Err(CommentServiceError::InvalidForm);
        }

        let updated = self
            .comment_repo
            .update_text(comment_id, &form.text)
            .await
            .context("Failed to update comment")?;
        if !updated {
            return Err(CommentServiceError::NotFound(comment_id));
        }

        comment.text = form.text.clone();
        Ok(comment)
    }

    /// Delete the user's own comment, returning it
    pub async fn delete(&self, comment_id: i64, user: &User) -> Result<Comment, CommentServiceError> {
        let comment = self.get_owned(comment_id, user).await?;

        self.comment_repo
            .delete(comment_id)
            .await
            .context("Failed to delete comment")?;

        tracing::info!("User {} deleted comment {}", user.id, comment_id);
        Ok(comment)
    }

    pub async fn count(&self) -> Result<i64, CommentServiceError> {
        Ok(self
            .comment_repo
            .count()
            .await
            .context("Failed to count comments")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxNewsRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::forms::REQUIRED_FIELD;
    use crate::models::CreateNewsInput;

    struct Fixture {
        service: CommentService,
        news_id: i64,
        author: User,
        not_author: User,
    }

    async fn setup() -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let news = news_repo
            .create(&CreateNewsInput::new("Заголовок", "Текст"))
            .await
            .unwrap();

        let users = SqlxUserRepository::new(pool.clone());
        let author = users
            .create(&User::new("Автор".to_string(), "hash".to_string()))
            .await
            .unwrap();
        let not_author = users
            .create(&User::new("Не автор".to_string(), "hash".to_string()))
            .await
            .unwrap();

        Fixture {
            service: CommentService::new(
                SqlxCommentRepository::boxed(pool),
                news_repo,
                BannedWords::default(),
            ),
            news_id: news.id,
            author,
            not_author,
        }
    }

    async fn create_comment(f: &Fixture) -> Comment {
        f.service
            .create(f.news_id, &f.author, &mut CommentForm::new("Текст комментария"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_comment() {
        let f = setup().await;

        let comment = create_comment(&f).await;

        assert_eq!(comment.text, "Текст комментария");
        assert_eq!(comment.news_id, f.news_id);
        assert_eq!(comment.author_id, f.author.id);
        assert_eq!(f.service.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_with_banned_words_writes_nothing() {
        let f = setup().await;

        for word in f.service.banned_words().words().to_vec() {
            let mut form = CommentForm::new(format!("Текст с {} внутри", word));
            let result = f.service.create(f.news_id, &f.author, &mut form).await;

            assert!(matches!(result, Err(CommentServiceError::InvalidForm)));
            assert!(form.errors.has("text", f.service.banned_words().warning()));
        }
        assert_eq!(f.service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_empty_comment() {
        let f = setup().await;
        let mut form = CommentForm::new("");

        let result = f.service.create(f.news_id, &f.author, &mut form).await;

        assert!(matches!(result, Err(CommentServiceError::InvalidForm)));
        assert!(form.errors.has("text", REQUIRED_FIELD));
    }

    #[tokio::test]
    async fn test_create_for_unknown_news() {
        let f = setup().await;
        let result = f
            .service
            .create(9999, &f.author, &mut CommentForm::new("text"))
            .await;
        assert!(matches!(result, Err(CommentServiceError::NewsNotFound(9999))));
    }

    #[tokio::test]
    async fn test_get_owned_hides_other_users_comments() {
        let f = setup().await;
        let comment = create_comment(&f).await;

        assert!(f.service.get_owned(comment.id, &f.author).await.is_ok());
        assert!(matches!(
            f.service.get_owned(comment.id, &f.not_author).await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.service.get_owned(9999, &f.author).await,
            Err(CommentServiceError::NotFound(9999))
        ));
    }

    #[tokio::test]
    async fn test_author_can_update() {
        let f = setup().await;
        let comment = create_comment(&f).await;

        let mut form = CommentForm::new("Обновлённый комментарий");
        let updated = f.service.update(comment.id, &f.author, &mut form).await.unwrap();

        assert_eq!(updated.text, "Обновлённый комментарий");
        assert_eq!(updated.author_id, f.author.id);
        let stored = f.service.get_owned(comment.id, &f.author).await.unwrap();
        assert_eq!(stored.text, "Обновлённый комментарий");
    }

    #[tokio::test]
    async fn test_other_user_cannot_update() {
        let f = setup().await;
        let comment = create_comment(&f).await;

        let mut form = CommentForm::new("Попытка взлома");
        let result = f.service.update(comment.id, &f.not_author, &mut form).await;

        assert!(matches!(result, Err(CommentServiceError::NotFound(_))));
        let stored = f.service.get_owned(comment.id, &f.author).await.unwrap();
        assert_eq!(stored.text, "Текст комментария");
    }

    #[tokio::test]
    async fn test_update_rejects_banned_words() {
        let f = setup().await;
        let comment = create_comment(&f).await;

        let mut form = CommentForm::new("Ты негодяй");
        let result = f.service.update(comment.id, &f.author, &mut form).await;

        assert!(matches!(result, Err(CommentServiceError::InvalidForm)));
        let stored = f.service.get_owned(comment.id, &f.author).await.unwrap();
        assert_eq!(stored.text, "Текст комментария");
    }

    #[tokio::test]
    async fn test_delete_comment() {
        let f = setup().await;
        let comment = create_comment(&f).await;

        assert!(matches!(
            f.service.delete(comment.id, &f.not_author).await,
            Err(CommentServiceError::NotFound(_))
        ));
        assert_eq!(f.service.count().await.unwrap(), 1);

        let deleted = f.service.delete(comment.id, &f.author).await.unwrap();
        assert_eq!(deleted.news_id, f.news_id);
        assert_eq!(f.service.count().await.unwrap(), 0);
    }
}
