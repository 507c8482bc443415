//! HTTP layer - page handlers and routing
//!
//! It includes:
//! - News pages (home feed, detail with comments)
//! - Comment edit/delete pages
//! - Login, logout and signup pages

pub mod auth;
pub mod comments;
pub mod context;
pub mod middleware;
pub mod news;

use axum::{middleware as axum_middleware, Router};
use tower_http::trace::TraceLayer;

pub use middleware::{AppState, AuthenticatedUser, CurrentUser, PageError};

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(news::router())
        .merge(comments::router())
        .nest("/auth", auth::router())
        .fallback(middleware::not_found)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
