//! News service
//!
//! The home feed and the detail page data.

use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::models::{CreateNewsInput, News, NewsWithComments, NewsWithCount, TITLE_MAX_LENGTH};
use anyhow::Context;
use std::sync::Arc;

/// Number of news items on the home page unless configured otherwise
pub const DEFAULT_NEWS_COUNT_ON_HOME_PAGE: u32 = 10;

/// Error types for news service operations
#[derive(Debug, thiserror::Error)]
pub enum NewsServiceError {
    /// News item not found
    #[error("News not found: {0}")]
    NotFound(i64),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// News service
pub struct NewsService {
    news_repo: Arc<dyn NewsRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    home_page_count: u32,
}

impl NewsService {
    pub fn with_home_page_count(
        news_repo: Arc<dyn NewsRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        home_page_count: u32,
    ) -> Self {
        Self {
            news_repo,
            comment_repo,
            home_page_count,
        }
    }

    pub fn home_page_count(&self) -> u32 {
        self.home_page_count
    }

    /// Freshest news for the home page, newest date first
    pub async fn home_feed(&self) -> Result<Vec<NewsWithCount>, NewsServiceError> {
        let feed = self
            .news_repo
            .list_latest(i64::from(self.home_page_count))
            .await
            .context("Failed to load home feed")?;

        Ok(feed)
    }

    /// A news item with its comments, oldest comment first
    pub async fn detail(&self, news_id: i64) -> Result<NewsWithComments, NewsServiceError> {
        let news = self
            .news_repo
            .get_by_id(news_id)
            .await
            .context("Failed to get news")?
            .ok_or(NewsServiceError::NotFound(news_id))?;

        let comments = self
            .comment_repo
            .list_by_news(news_id)
            .await
            .context("Failed to list comments")?;

        Ok(NewsWithComments { news, comments })
    }

    /// Publish a news item
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the title is empty or longer than 50 characters,
    ///   or the text is empty
    pub async fn create(&self, input: CreateNewsInput) -> Result<News, NewsServiceError> {
        let title_length = input.title.trim().chars().count();
        if title_length == 0 {
            return Err(NewsServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if title_length > TITLE_MAX_LENGTH {
            return Err(NewsServiceError::ValidationError(format!(
                "Title cannot exceed {} characters",
                TITLE_MAX_LENGTH
            )));
        }
        if input.text.trim().is_empty() {
            return Err(NewsServiceError::ValidationError(
                "Text cannot be empty".to_string(),
            ));
        }

        let news = self
            .news_repo
            .create(&input)
            .await
            .context("Failed to create news")?;

        tracing::info!("Published news {} ({})", news.id, news.title);
        Ok(news)
    }

    pub async fn count(&self) -> Result<i64, NewsServiceError> {
        Ok(self.news_repo.count().await.context("Failed to count news")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxCommentRepository, SqlxNewsRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CreateCommentInput, User};
    use chrono::{Duration, NaiveDate, Utc};
    use proptest::prelude::*;

    async fn setup_test_service(count: u32) -> (DynDatabasePool, NewsService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = NewsService::with_home_page_count(
            SqlxNewsRepository::boxed(pool.clone()),
            SqlxCommentRepository::boxed(pool.clone()),
            count,
        );
        (pool, service)
    }

    /// Creates `n` news items, item `i` dated `i` days ago
    async fn create_news_list(service: &NewsService, n: i64) -> Vec<News> {
        let today = Utc::now().date_naive();
        let mut created = Vec::new();
        for i in 0..n {
            let input = CreateNewsInput::new(format!("Новость {}", i), "Просто текст.")
                .with_date(today - Duration::days(i));
            created.push(service.create(input).await.unwrap());
        }
        created
    }

    #[tokio::test]
    async fn test_home_feed_is_truncated() {
        let (_pool, service) = setup_test_service(DEFAULT_NEWS_COUNT_ON_HOME_PAGE).await;
        create_news_list(&service, i64::from(DEFAULT_NEWS_COUNT_ON_HOME_PAGE) + 1).await;

        let feed = service.home_feed().await.unwrap();

        assert_eq!(feed.len(), DEFAULT_NEWS_COUNT_ON_HOME_PAGE as usize);
        assert_eq!(service.count().await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_home_feed_newest_first() {
        let (_pool, service) = setup_test_service(10).await;
        let created = create_news_list(&service, 5).await;

        let feed = service.home_feed().await.unwrap();

        assert_eq!(feed[0].news.id, created[0].id);
        let dates: Vec<NaiveDate> = feed.iter().map(|n| n.news.date).collect();
        let mut sorted = dates.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(dates, sorted);
    }

    #[tokio::test]
    async fn test_detail_includes_comments_in_order() {
        let (pool, service) = setup_test_service(10).await;
        let news = service
            .create(CreateNewsInput::new("Заголовок", "Текст"))
            .await
            .unwrap();
        let author = SqlxUserRepository::new(pool.clone())
            .create(&User::new("Автор".to_string(), "hash".to_string()))
            .await
            .unwrap();

        let comments = SqlxCommentRepository::new(pool.clone());
        let now = Utc::now();
        for i in (0..10).rev() {
            comments
                .create(
                    &CreateCommentInput {
                        news_id: news.id,
                        text: format!("Комментарий {}", i),
                    },
                    author.id,
                    now + Duration::minutes(i),
                )
                .await
                .unwrap();
        }

        let detail = service.detail(news.id).await.unwrap();

        assert_eq!(detail.news, news);
        assert_eq!(detail.comments.len(), 10);
        let texts: Vec<&str> = detail.comments.iter().map(|c| c.comment.text.as_str()).collect();
        assert_eq!(texts[0], "Комментарий 0");
        assert_eq!(texts[9], "Комментарий 9");
    }

    #[tokio::test]
    async fn test_detail_not_found() {
        let (_pool, service) = setup_test_service(10).await;
        let result = service.detail(42).await;
        assert!(matches!(result, Err(NewsServiceError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_create_validates_title() {
        let (_pool, service) = setup_test_service(10).await;

        let empty = service.create(CreateNewsInput::new("  ", "Text")).await;
        assert!(matches!(empty, Err(NewsServiceError::ValidationError(_))));

        let long = service
            .create(CreateNewsInput::new("Я".repeat(TITLE_MAX_LENGTH + 1), "Text"))
            .await;
        assert!(matches!(long, Err(NewsServiceError::ValidationError(_))));

        let exact = service
            .create(CreateNewsInput::new("Я".repeat(TITLE_MAX_LENGTH), "Text"))
            .await;
        assert!(exact.is_ok());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// The home feed never exceeds the configured count and is sorted by date
        #[test]
        fn home_feed_bounded_and_ordered(
            count in 1u32..8,
            offsets in proptest::collection::vec(0i64..365, 0..15),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let (_pool, service) = setup_test_service(count).await;
                let today = Utc::now().date_naive();
                for (i, offset) in offsets.iter().enumerate() {
                    let input = CreateNewsInput::new(format!("News {}", i), "Text")
                        .with_date(today - Duration::days(*offset));
                    service.create(input).await.unwrap();
                }

                let feed = service.home_feed().await.unwrap();
                prop_assert_eq!(feed.len(), offsets.len().min(count as usize));

                let dates: Vec<NaiveDate> = feed.iter().map(|n| n.news.date).collect();
                prop_assert!(dates.windows(2).all(|w| w[0] >= w[1]));

                // The feed holds the freshest dates
                let mut expected: Vec<i64> = offsets.clone();
                expected.sort();
                let expected_dates: Vec<NaiveDate> = expected
                    .iter()
                    .take(count as usize)
                    .map(|o| today - Duration::days(*o))
                    .collect();
                prop_assert_eq!(dates, expected_dates);
                Ok(())
            });
            result?;
        }
    }
}
