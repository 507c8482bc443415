//! User model
//!
//! Users only sign in and own comments; there are no roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum username length, matching the `users.username` column
pub const USERNAME_MAX_LENGTH: usize = 150;

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new User; `password_hash` must already be hashed.
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }

    /// Whether this user wrote the content with the given author id
    pub fn is_author_of(&self, author_id: i64) -> bool {
        self.id == author_id
    }
}

/// Input for creating a new user (before password hashing)
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    /// Plaintext password (will be hashed)
    pub password: String,
}

impl CreateUserInput {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}
