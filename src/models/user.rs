//! User model
//!
//! The password hash is write-only from the outside world: it is set through
//! the one-way hashing service, skipped during serialization and redacted
//! from debug output. No accessor returns it to API callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// User entity representing a registered account.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Password hash (argon2id PHC string), never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password`.
    pub fn new(username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by the database
            username,
            password_hash,
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new("darcy".to_string(), "$argon2id$hash".to_string());

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "darcy");
        assert_eq!(user.password_hash, "$argon2id$hash");
    }

    #[test]
    fn test_serialization_excludes_hash() {
        let user = User::new("darcy".to_string(), "$argon2id$secret".to_string());
        let json = serde_json::to_value(&user).expect("Failed to serialize");

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "darcy");
    }

    #[test]
    fn test_debug_redacts_hash() {
        let user = User::new("darcy".to_string(), "$argon2id$secret".to_string());
        let debug = format!("{:?}", user);

        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
