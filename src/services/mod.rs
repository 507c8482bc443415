//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They
//! enforce the rules (ownership of comments, banned words, credential
//! checks) and report failures as typed errors.

pub mod comment;
pub mod news;
pub mod password;
pub mod user;

pub use comment::{CommentService, CommentServiceError};
pub use news::{NewsService, NewsServiceError, DEFAULT_NEWS_COUNT_ON_HOME_PAGE};
pub use password::{hash_password, verify_password};
pub use user::{UserService, UserServiceError, DEFAULT_SESSION_EXPIRATION_DAYS};
