use thiserror::Error;

/// Convenient result alias for the todo library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Raised when a todo with the requested identifier does not exist.
    #[error("Todo not found")]
    TodoNotFound { id: i64 },

    /// Raised when a user lookup by username finds nothing.
    #[error("User not found")]
    UserNotFound { username: String },

    /// Raised when a username/password pair does not match a stored user.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Raised when a presented refresh token does not match the stored hash.
    #[error("User not found or hash not correct")]
    RefreshTokenMismatch,

    /// Raised when a bearer token is missing, expired, or fails verification.
    #[error("{message}")]
    InvalidToken { message: String },

    /// Raised when a username is already registered.
    #[error("username '{username}' is already taken")]
    UsernameTaken { username: String },

    /// Raised when caller-supplied input fails validation.
    #[error("{message}")]
    Validation { message: String },

    /// Raised when a stored timestamp cannot be parsed back.
    #[error("invalid timestamp '{value}' in column {column}")]
    InvalidTimestamp { column: &'static str, value: String },

    /// Raised when the shared database connection lock was poisoned by a panic.
    #[error("database connection lock poisoned")]
    ConnectionPoisoned,

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for bcrypt hashing errors.
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Wrapper for JWT signing errors.
    #[error("token signing failed: {0}")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),
}

impl Error {
    /// Stable machine-readable code for errors a client can act upon.
    ///
    /// Internal failures (storage, hashing, signing) have no code.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::TodoNotFound { .. } => Some("TODO_NOT_FOUND"),
            Error::UserNotFound { .. } => Some("USER_NOT_FOUND"),
            Error::InvalidCredentials => Some("INVALID_CREDENTIALS"),
            Error::RefreshTokenMismatch => Some("REFRESH_TOKEN_MISMATCH"),
            Error::InvalidToken { .. } => Some("INVALID_TOKEN"),
            Error::UsernameTaken { .. } => Some("USERNAME_TAKEN"),
            Error::Validation { .. } => Some("VALIDATION_FAILED"),
            _ => None,
        }
    }
}
