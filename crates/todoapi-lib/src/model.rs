//! Domain entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric identifier for a todo item.
pub type TodoId = i64;

/// A single todo item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub content: String,
    pub is_done: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
}

impl Todo {
    /// Mark the todo as completed and bump its update timestamp.
    pub fn mark_as_done(&mut self) {
        self.is_done = true;
        self.updated_date = Utc::now();
    }

    /// Reopen the todo and bump its update timestamp.
    pub fn mark_as_undone(&mut self) {
        self.is_done = false;
        self.updated_date = Utc::now();
    }
}

/// A registered user, including credential material.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// bcrypt hash of the password.
    pub password: String,
    pub create_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    /// bcrypt hash of the current refresh token fingerprint, if any.
    pub hash_refresh_token: Option<String>,
}

impl User {
    /// Drop the password hash, keeping everything a caller may see.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            create_date: self.create_date,
            updated_date: self.updated_date,
            last_login: self.last_login,
        }
    }
}

/// A user without credential material.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub create_date: DateTime<Utc>,
    pub updated_date: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_todo() -> Todo {
        let past = Utc::now() - Duration::hours(1);
        Todo {
            id: 1,
            content: "write tests".to_string(),
            is_done: false,
            created_date: past,
            updated_date: past,
        }
    }

    #[test]
    fn test_mark_as_done_bumps_updated_date() {
        let mut todo = sample_todo();
        let before = todo.updated_date;
        todo.mark_as_done();
        assert!(todo.is_done);
        assert!(todo.updated_date > before);
    }

    #[test]
    fn test_mark_as_undone() {
        let mut todo = sample_todo();
        todo.mark_as_done();
        todo.mark_as_undone();
        assert!(!todo.is_done);
    }

    #[test]
    fn test_profile_drops_password() {
        let now = Utc::now();
        let user = User {
            id: 7,
            username: "alice".to_string(),
            password: "$2b$12$hash".to_string(),
            create_date: now,
            updated_date: now,
            last_login: None,
            hash_refresh_token: Some("token-hash".to_string()),
        };
        let profile = user.profile();
        assert_eq!(profile.id, 7);
        assert_eq!(profile.username, "alice");
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("token-hash"));
    }
}
