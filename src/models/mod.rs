//! Data models
//!
//! Database entities (News, Comment, User, Session) and the input types
//! the services accept.

mod comment;
mod news;
mod session;
mod user;

pub use comment::{Comment, CommentWithAuthor, CreateCommentInput};
pub use news::{CreateNewsInput, News, NewsWithComments, NewsWithCount, TITLE_MAX_LENGTH};
pub use session::Session;
pub use user::{CreateUserInput, User, USERNAME_MAX_LENGTH};
