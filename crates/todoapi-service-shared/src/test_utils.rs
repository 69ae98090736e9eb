//! Test fixtures for handler and pipeline tests.
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for the service crate's integration tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::http::{HeaderMap, Method, Uri};
use todoapi_lib::{
    BcryptHasher, Database, JwtConfig, PasswordHasher, SqliteUserRepository, UserRepository,
};

use crate::config::ServiceConfig;
use crate::context::RequestContext;
use crate::exception::ErrorLogger;
use crate::middleware::RequestId;
use crate::state::AppState;

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_BCRYPT_COST: u32 = 4;

/// Password given to every user created by [`seed_user`].
pub const TEST_PASSWORD: &str = "correct horse";

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-access-secret".to_string(),
        expiration_secs: 60,
        refresh_secret: "test-refresh-secret".to_string(),
        refresh_expiration_secs: 600,
    }
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        jwt: test_jwt_config(),
        database_path: PathBuf::from(":memory:"),
        port: 0,
        bcrypt_cost: TEST_BCRYPT_COST,
    }
}

/// A fresh state over its own in-memory database.
///
/// # Panics
///
/// Panics if SQLite cannot open an in-memory database.
pub fn test_state() -> AppState {
    let database = Database::open_in_memory()
        .unwrap_or_else(|e| panic!("failed to open in-memory database: {e}"));
    AppState::from_database(
        Arc::new(database),
        test_jwt_config(),
        Arc::new(BcryptHasher::new(TEST_BCRYPT_COST)),
    )
}

/// Register `username` with [`TEST_PASSWORD`] in the state's database.
///
/// # Panics
///
/// Panics if the user cannot be inserted.
pub fn seed_user(state: &AppState, username: &str) {
    let hash = BcryptHasher::new(TEST_BCRYPT_COST)
        .hash(TEST_PASSWORD)
        .unwrap_or_else(|e| panic!("failed to hash test password: {e}"));
    SqliteUserRepository::new(Arc::clone(state.database()))
        .insert_user(username, &hash)
        .unwrap_or_else(|e| panic!("failed to seed user {username}: {e}"));
}

/// Context for `method uri` as seen from `http://localhost`.
///
/// # Panics
///
/// Panics if `uri` does not parse.
pub fn test_request_context(method: Method, uri: &str) -> RequestContext {
    let uri: Uri = uri
        .parse()
        .unwrap_or_else(|e| panic!("invalid test uri {uri:?}: {e}"));
    RequestContext::capture(&method, &uri, &HeaderMap::new(), Some(&test_request_id()))
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> RequestId {
    RequestId::new(format!("test-{}", uuid::Uuid::now_v7()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub context: String,
    pub message: String,
    pub trace: Option<String>,
}

/// [`ErrorLogger`] that keeps every call for later assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogger {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
    }
}

impl ErrorLogger for RecordingLogger {
    fn warn(&self, context: &str, message: &str) {
        self.push(LogEntry {
            level: LogLevel::Warn,
            context: context.to_string(),
            message: message.to_string(),
            trace: None,
        });
    }

    fn error(&self, context: &str, message: &str, trace: Option<&str>) {
        self.push(LogEntry {
            level: LogLevel::Error,
            context: context.to_string(),
            message: message.to_string(),
            trace: trace.map(str::to_string),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_isolated() {
        let a = test_state();
        let b = test_state();
        a.todos().add("only in a").unwrap();
        assert!(b.todos().list().unwrap().is_empty());
    }

    #[test]
    fn test_seeded_user_can_log_in() {
        let state = test_state();
        seed_user(&state, "alice");
        let profile = state.login().login("alice", TEST_PASSWORD).unwrap();
        assert_eq!(profile.username, "alice");
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(test_request_id(), test_request_id());
    }

    #[test]
    fn test_recording_logger_keeps_order() {
        let logger = RecordingLogger::default();
        logger.warn("ctx", "first");
        logger.error("ctx", "second", Some("trace"));
        let entries = logger.entries();
        assert_eq!(entries[0].level, LogLevel::Warn);
        assert_eq!(entries[1].trace.as_deref(), Some("trace"));
    }

    #[test]
    fn test_request_context_fixture() {
        let ctx = test_request_context(Method::DELETE, "/api/v1/todo/todo?id=4");
        assert_eq!(ctx.path, "/api/v1/todo/todo");
        assert_eq!(ctx.self_link, "http://localhost/api/v1/todo/todo?id=4");
    }
}
