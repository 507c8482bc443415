//! News pages
//!
//! - GET / - home feed
//! - GET /news/{id}/ - news item with its comments
//! - POST /news/{id}/ - add a comment (signed-in users)

use axum::{
    extract::{rejection::FormRejection, OriginalUri, State},
    response::Response,
    routing::get,
    Form, Router,
};

use crate::api::context::{detail_context, home_context};
use crate::api::middleware::{found, login_redirect, AppState, CurrentUser, IdParam, PageError};
use crate::forms::CommentForm;
use crate::services::CommentServiceError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/news/{id}/", get(detail).post(add_comment))
}

/// Link to the comments of a news item
pub fn comments_url(news_id: i64) -> String {
    format!("/news/{}/#comments", news_id)
}

pub async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Response, PageError> {
    let context = home_context(&state, user).await?;
    state.render("news/home.html", &context)
}

pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    IdParam(news_id): IdParam,
) -> Result<Response, PageError> {
    let context = detail_context(&state, news_id, user, None).await?;
    state.render("news/detail.html", &context)
}

/// Add a comment; an invalid form re-renders the page with its errors
///
/// Anonymous visitors are sent to login whatever the body holds. A body
/// that is not a urlencoded form counts as an empty form.
pub async fn add_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    OriginalUri(uri): OriginalUri,
    IdParam(news_id): IdParam,
    form: Result<Form<CommentForm>, FormRejection>,
) -> Result<Response, PageError> {
    let Some(user) = user else {
        return Ok(login_redirect(&uri));
    };

    let mut form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            tracing::debug!("Unreadable comment form: {}", rejection);
            CommentForm::default()
        }
    };

    match state.comment_service.create(news_id, &user, &mut form).await {
        Ok(_) => Ok(found(&comments_url(news_id))),
        Err(CommentServiceError::InvalidForm) => {
            let context = detail_context(&state, news_id, Some(user), Some(form)).await?;
            state.render("news/detail.html", &context)
        }
        Err(e) => Err(e.into()),
    }
}
