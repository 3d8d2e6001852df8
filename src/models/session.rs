//! Session model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One live session per user, replaced on each login.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Session {
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// A session expires `ttl_seconds` after it was created.
    pub fn is_expired(&self, ttl_seconds: u64, now: DateTime<Utc>) -> bool {
        self.created_at + chrono::Duration::seconds(ttl_seconds as i64) < now
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_created_at(created_at: DateTime<Utc>) -> Session {
        Session {
            user_id: 1,
            token: "t".to_string(),
            created_at,
        }
    }

    #[test]
    fn session_is_live_within_ttl() {
        let now = Utc::now();
        let session = session_created_at(now - chrono::Duration::seconds(100));
        assert!(!session.is_expired(3600, now));
    }

    #[test]
    fn session_expires_after_ttl() {
        let now = Utc::now();
        let session = session_created_at(now - chrono::Duration::seconds(3601));
        assert!(session.is_expired(3600, now));
    }
}
