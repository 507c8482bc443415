//! Comment editing pages
//!
//! Only the author may open these; anyone else gets a 404. Anonymous
//! visitors never reach the handlers, `require_login` sends them to the
//! login page first.

use axum::{
    extract::State,
    middleware as axum_middleware,
    response::Response,
    routing::get,
    Extension, Form, Router,
};

use crate::api::context::{delete_context, edit_context};
use crate::api::middleware::{self, found, AppState, AuthenticatedUser, IdParam, PageError};
use crate::api::news::comments_url;
use crate::forms::CommentForm;
use crate::services::CommentServiceError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/edit_comment/{id}/", get(edit_page).post(edit))
        .route(
            "/delete_comment/{id}/",
            get(delete_page).post(delete).delete(delete),
        )
        .route_layer(axum_middleware::from_fn(middleware::require_login))
}

pub async fn edit_page(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    IdParam(comment_id): IdParam,
) -> Result<Response, PageError> {
    let context = edit_context(&state, comment_id, user, None).await?;
    state.render("news/edit.html", &context)
}

pub async fn edit(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    IdParam(comment_id): IdParam,
    Form(mut form): Form<CommentForm>,
) -> Result<Response, PageError> {
    match state.comment_service.update(comment_id, &user, &mut form).await {
        Ok(comment) => Ok(found(&comments_url(comment.news_id))),
        Err(CommentServiceError::InvalidForm) => {
            let context = edit_context(&state, comment_id, user, Some(form)).await?;
            state.render("news/edit.html", &context)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_page(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    IdParam(comment_id): IdParam,
) -> Result<Response, PageError> {
    let context = delete_context(&state, comment_id, user).await?;
    state.render("news/delete.html", &context)
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user)): Extension<AuthenticatedUser>,
    IdParam(comment_id): IdParam,
) -> Result<Response, PageError> {
    let comment = state.comment_service.delete(comment_id, &user).await?;
    Ok(found(&comments_url(comment.news_id)))
}
