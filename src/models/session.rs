//! Session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Login session, identified by the token stored in the session cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Start a session for `user_id` with a fresh random token
    pub fn start(user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + lifetime,
            created_at: now,
        }
    }

    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_generates_unique_tokens() {
        let a = Session::start(1, Duration::days(14));
        let b = Session::start(1, Duration::days(14));

        assert_ne!(a.id, b.id);
        assert_eq!(a.user_id, 1);
        assert!(!a.is_expired());
    }

    #[test]
    fn test_negative_lifetime_is_expired() {
        let session = Session::start(1, Duration::hours(-1));
        assert!(session.is_expired());
    }
}
