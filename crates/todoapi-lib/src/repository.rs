//! Persistence ports consumed by the use cases.
//!
//! The SQLite adapters in [`crate::db`] implement these; tests may supply
//! their own doubles.

use crate::error::Result;
use crate::model::{Todo, TodoId, User};

/// Storage for todo items.
pub trait TodoRepository: Send + Sync {
    /// Persist a new, not-done todo and return it with its assigned id.
    fn insert(&self, content: &str) -> Result<Todo>;

    /// All todos ordered by id.
    fn find_all(&self) -> Result<Vec<Todo>>;

    /// Fetch one todo; `Error::TodoNotFound` when absent.
    fn find_by_id(&self, id: TodoId) -> Result<Todo>;

    /// Set the completion flag; `Error::TodoNotFound` when absent.
    fn update_content(&self, id: TodoId, is_done: bool) -> Result<()>;

    /// Remove a todo; `Error::TodoNotFound` when absent.
    fn delete_by_id(&self, id: TodoId) -> Result<()>;
}

/// Storage for users and their credential material.
pub trait UserRepository: Send + Sync {
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Register a user with an already-hashed password.
    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User>;

    fn update_last_login(&self, username: &str) -> Result<()>;

    /// Store (or clear, with `None`) the hashed refresh token.
    fn update_refresh_token(&self, username: &str, refresh_token_hash: Option<&str>)
        -> Result<()>;
}
