//! Session model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session entity backing the `session` cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session ID (the cookie token)
    pub id: String,
    /// Associated user ID
    pub user_id: i64,
    /// Expiration timestamp
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Check if the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_not_expired() {
        let session = Session {
            id: "token".to_string(),
            user_id: 1,
            expires_at: Utc::now() + Duration::days(1),
            created_at: Utc::now(),
        };
        assert!(!session.is_expired());
    }

    #[test]
    fn test_session_expired() {
        let session = Session {
            id: "token".to_string(),
            user_id: 1,
            expires_at: Utc::now() - Duration::minutes(1),
            created_at: Utc::now() - Duration::days(8),
        };
        assert!(session.is_expired());
    }
}
