//! News model

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::CommentWithAuthor;

/// Maximum title length, matching the `news.title` column
pub const TITLE_MAX_LENGTH: usize = 50;

/// News item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub text: String,
    /// Publication date
    pub date: NaiveDate,
}

/// News item as listed on the home page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsWithCount {
    #[serde(flatten)]
    pub news: News,
    pub comment_count: i64,
}

/// News item with its comments, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsWithComments {
    #[serde(flatten)]
    pub news: News,
    pub comments: Vec<CommentWithAuthor>,
}

/// Input for creating a news item
#[derive(Debug, Clone, Default)]
pub struct CreateNewsInput {
    pub title: String,
    pub text: String,
    /// Defaults to today when not given
    pub date: Option<NaiveDate>,
}

impl CreateNewsInput {
    pub fn new(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            date: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Date the item is stored with
    pub fn resolved_date(&self) -> NaiveDate {
        self.date.unwrap_or_else(|| Utc::now().date_naive())
    }
}
