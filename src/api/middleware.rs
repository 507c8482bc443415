//! HTTP middleware and shared handler plumbing
//!
//! Contains:
//! - `AppState`, the services shared by all handlers
//! - session cookie authentication (`optional_auth`) and the login wall
//!   for comment editing (`require_login`)
//! - `PageError`, mapping service failures to 404/500 pages

use axum::{
    extract::{FromRequestParts, Path, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxCommentRepository, SqlxNewsRepository, SqlxSessionRepository, SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::forms::BannedWords;
use crate::models::User;
use crate::services::{
    CommentService, CommentServiceError, NewsService, NewsServiceError, UserService,
    UserServiceError,
};
use crate::templates::{TemplateEngine, TemplateError, NOT_FOUND_PAGE, SERVER_ERROR_PAGE};

/// Login page; anonymous visitors are sent here
pub const LOGIN_URL: &str = "/auth/login/";

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub news_service: Arc<NewsService>,
    pub comment_service: Arc<CommentService>,
    pub user_service: Arc<UserService>,
    pub templates: Arc<TemplateEngine>,
    pub session_cookie_name: Arc<str>,
}

impl AppState {
    /// Wire repositories and services over `pool` as configured
    pub fn from_pool(pool: DynDatabasePool, config: &Config) -> anyhow::Result<Self> {
        let news_repo = SqlxNewsRepository::boxed(pool.clone());
        let comment_repo = SqlxCommentRepository::boxed(pool.clone());

        Ok(Self {
            news_service: Arc::new(NewsService::with_home_page_count(
                news_repo.clone(),
                comment_repo.clone(),
                config.news.news_count_on_home_page,
            )),
            comment_service: Arc::new(CommentService::new(
                comment_repo,
                news_repo,
                BannedWords::from_config(&config.moderation),
            )),
            user_service: Arc::new(UserService::with_session_expiration(
                SqlxUserRepository::boxed(pool.clone()),
                SqlxSessionRepository::boxed(pool),
                config.session.expiration_days,
            )),
            templates: Arc::new(TemplateEngine::new()?),
            session_cookie_name: Arc::from(config.session.cookie_name.as_str()),
        })
    }

    /// Render a page template with 200 OK
    pub fn render<C: Serialize>(&self, template: &str, context: &C) -> Result<Response, PageError> {
        let html = self.templates.render(template, context)?;
        Ok(Html(html).into_response())
    }

    /// `Set-Cookie` value opening a session
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, PageError> {
        let cookie = format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.session_cookie_name,
            token,
            self.user_service.session_lifetime().num_seconds()
        );
        HeaderValue::from_str(&cookie).map_err(|e| PageError::Internal(e.into()))
    }

    /// `Set-Cookie` value removing the session cookie
    pub fn clear_session_cookie(&self) -> Result<HeaderValue, PageError> {
        let cookie = format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            self.session_cookie_name
        );
        HeaderValue::from_str(&cookie).map_err(|e| PageError::Internal(e.into()))
    }
}

/// Signed-in user, inserted into request extensions by [`optional_auth`]
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// The signed-in user, if any
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|user| user.0.clone()),
        ))
    }
}

/// Numeric id from the path; anything else is a 404 like an unknown route
#[derive(Debug, Clone, Copy)]
pub struct IdParam(pub i64);

impl<S> FromRequestParts<S> for IdParam
where
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|_| PageError::NotFound)?;
        Ok(IdParam(id))
    }
}

/// Page-level error
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => (StatusCode::NOT_FOUND, Html(NOT_FOUND_PAGE)).into_response(),
            PageError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR_PAGE)).into_response()
            }
        }
    }
}

impl From<NewsServiceError> for PageError {
    fn from(e: NewsServiceError) -> Self {
        match e {
            NewsServiceError::NotFound(_) => PageError::NotFound,
            NewsServiceError::ValidationError(msg) => PageError::Internal(anyhow::anyhow!(msg)),
            NewsServiceError::InternalError(e) => PageError::Internal(e),
        }
    }
}

impl From<CommentServiceError> for PageError {
    fn from(e: CommentServiceError) -> Self {
        match e {
            CommentServiceError::NewsNotFound(_) | CommentServiceError::NotFound(_) => {
                PageError::NotFound
            }
            CommentServiceError::InvalidForm => {
                PageError::Internal(anyhow::anyhow!("Unhandled invalid comment form"))
            }
            CommentServiceError::InternalError(e) => PageError::Internal(e),
        }
    }
}

impl From<UserServiceError> for PageError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::InternalError(e) => PageError::Internal(e),
            other => PageError::Internal(other.into()),
        }
    }
}

impl From<TemplateError> for PageError {
    fn from(e: TemplateError) -> Self {
        PageError::Internal(e.into())
    }
}

/// 302 Found to `location`
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(e) => PageError::Internal(e.into()).into_response(),
    }
}

/// Redirect to the login page, coming back to `uri` afterwards
pub fn login_redirect(uri: &Uri) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    found(&format!("{}?next={}", LOGIN_URL, encode_next(target)))
}

/// Percent-encode a `next` value, leaving slashes readable
pub fn encode_next(path: &str) -> String {
    urlencoding::encode(path).replace("%2F", "/")
}

/// Only local absolute paths are followed after login
pub fn is_safe_next(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

/// Extract the session token from the session cookie
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|cookie| cookie.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Attach the signed-in user to the request when the session cookie is valid
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_session_token(request.headers(), &state.session_cookie_name) {
        match state.user_service.validate_session(&token).await {
            Ok(Some(user)) => {
                request.extensions_mut().insert(AuthenticatedUser(user));
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Session validation failed: {}", e),
        }
    }
    next.run(request).await
}

/// Send anonymous visitors to the login page
pub async fn require_login(request: Request, next: Next) -> Response {
    if request.extensions().get::<AuthenticatedUser>().is_none() {
        return login_redirect(request.uri());
    }
    next.run(request).await
}

/// Fallback for unknown routes
pub async fn not_found() -> PageError {
    PageError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("csrftoken=abc; sessionid=token-123; theme=dark"),
        );

        assert_eq!(
            extract_session_token(&headers, "sessionid"),
            Some("token-123".to_string())
        );
        assert_eq!(extract_session_token(&headers, "session"), None);
    }

    #[test]
    fn test_extract_session_token_ignores_empty_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("sessionid="));
        assert_eq!(extract_session_token(&headers, "sessionid"), None);
    }

    #[test]
    fn test_encode_next_keeps_slashes() {
        assert_eq!(encode_next("/edit_comment/1/"), "/edit_comment/1/");
        assert_eq!(encode_next("/news/1/?a=b"), "/news/1/%3Fa%3Db");
    }

    #[test]
    fn test_login_redirect_location() {
        let response = login_redirect(&"/delete_comment/7/".parse::<Uri>().unwrap());

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "/auth/login/?next=/delete_comment/7/"
        );
    }

    #[test]
    fn test_is_safe_next() {
        assert!(is_safe_next("/news/1/"));
        assert!(!is_safe_next("//evil.example"));
        assert!(!is_safe_next("https://evil.example/"));
        assert!(!is_safe_next("/\\evil.example"));
    }
}
