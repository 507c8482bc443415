//! Page contexts
//!
//! Every page is rendered from one of these structs. The builders are public
//! so tests can inspect what a page receives without parsing HTML.

use serde::Serialize;

use super::middleware::{AppState, PageError};
use crate::forms::{CommentForm, LoginForm, SignupForm};
use crate::models::{Comment, NewsWithComments, NewsWithCount, User};

#[derive(Debug, Serialize)]
pub struct HomeContext {
    pub user: Option<User>,
    pub news_feed: Vec<NewsWithCount>,
}

#[derive(Debug, Serialize)]
pub struct DetailContext {
    pub user: Option<User>,
    pub news: NewsWithComments,
    /// Comment form, offered to signed-in users only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CommentForm>,
}

/// Edit and delete pages of a single comment
#[derive(Debug, Serialize)]
pub struct CommentContext {
    pub user: Option<User>,
    pub comment: Comment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<CommentForm>,
}

#[derive(Debug, Serialize)]
pub struct LoginContext {
    pub user: Option<User>,
    pub form: LoginForm,
}

#[derive(Debug, Serialize)]
pub struct SignupContext {
    pub user: Option<User>,
    pub form: SignupForm,
}

#[derive(Debug, Serialize)]
pub struct LoggedOutContext {
    pub user: Option<User>,
}

pub async fn home_context(state: &AppState, user: Option<User>) -> Result<HomeContext, PageError> {
    Ok(HomeContext {
        user,
        news_feed: state.news_service.home_feed().await?,
    })
}

/// Detail page of a news item
///
/// A signed-in user gets `form`, or an empty form when none is given.
pub async fn detail_context(
    state: &AppState,
    news_id: i64,
    user: Option<User>,
    form: Option<CommentForm>,
) -> Result<DetailContext, PageError> {
    let news = state.news_service.detail(news_id).await?;
    let form = user.as_ref().map(|_| form.unwrap_or_default());

    Ok(DetailContext { user, news, form })
}

/// Edit page; the form starts out with the stored text
pub async fn edit_context(
    state: &AppState,
    comment_id: i64,
    user: User,
    form: Option<CommentForm>,
) -> Result<CommentContext, PageError> {
    let comment = state.comment_service.get_owned(comment_id, &user).await?;
    let form = form.unwrap_or_else(|| CommentForm::new(comment.text.clone()));

    Ok(CommentContext {
        user: Some(user),
        comment,
        form: Some(form),
    })
}

pub async fn delete_context(
    state: &AppState,
    comment_id: i64,
    user: User,
) -> Result<CommentContext, PageError> {
    let comment = state.comment_service.get_owned(comment_id, &user).await?;

    Ok(CommentContext {
        user: Some(user),
        comment,
        form: None,
    })
}
