//! Application state shared by every axum handler.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use todoapi_lib::{
    BcryptHasher, Database, Error as LibError, IsAuthenticatedUseCases, JwtConfig,
    JwtTokenService, LoginUseCases, LogoutUseCases, PasswordHasher, SqliteTodoRepository,
    SqliteUserRepository, TodoUseCases,
};

use crate::config::ServiceConfig;

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// Failed to open or migrate the database.
    DatabaseOpen(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseOpen(e) => write!(f, "failed to open database: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DatabaseOpen(e) => Some(e),
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        Self::DatabaseOpen(err)
    }
}

/// Shared application state.
///
/// Cheap to clone; pass it with axum's `State` extractor.
///
/// ```ignore
/// use axum::{extract::State, routing::get, Router};
/// use todoapi_service_shared::AppState;
///
/// async fn count(State(state): State<AppState>) -> String {
///     state.todos().list().map(|t| t.len()).unwrap_or_default().to_string()
/// }
///
/// let state = AppState::open(&config)?;
/// let app = Router::new().route("/count", get(count)).with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    database: Arc<Database>,
    todos: TodoUseCases,
    login: LoginUseCases,
    logout: LogoutUseCases,
    is_authenticated: IsAuthenticatedUseCases,
    ws_clients: AtomicUsize,
}

impl AppState {
    /// Open the configured database file (migrating it) and wire the use cases.
    pub fn open(config: &ServiceConfig) -> Result<Self, AppStateError> {
        tracing::info!(path = %config.database_path.display(), "opening database");
        let database = Arc::new(Database::open(&config.database_path)?);
        tracing::info!(
            schema_version = database.schema_version()?,
            "database ready"
        );
        Ok(Self::from_database(
            database,
            config.jwt.clone(),
            Arc::new(BcryptHasher::new(config.bcrypt_cost)),
        ))
    }

    /// Wire the use cases over an already-open database.
    pub fn from_database(
        database: Arc<Database>,
        jwt: JwtConfig,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        let todo_repository = Arc::new(SqliteTodoRepository::new(Arc::clone(&database)));
        let user_repository = Arc::new(SqliteUserRepository::new(Arc::clone(&database)));

        Self {
            inner: Arc::new(AppStateInner {
                todos: TodoUseCases::new(todo_repository),
                login: LoginUseCases::new(
                    user_repository.clone(),
                    hasher,
                    Arc::new(JwtTokenService),
                    jwt,
                ),
                logout: LogoutUseCases::new(user_repository.clone()),
                is_authenticated: IsAuthenticatedUseCases::new(user_repository),
                database,
                ws_clients: AtomicUsize::new(0),
            }),
        }
    }

    pub fn database(&self) -> &Arc<Database> {
        &self.inner.database
    }

    pub fn todos(&self) -> &TodoUseCases {
        &self.inner.todos
    }

    pub fn login(&self) -> &LoginUseCases {
        &self.inner.login
    }

    pub fn logout(&self) -> &LogoutUseCases {
        &self.inner.logout
    }

    pub fn is_authenticated(&self) -> &IsAuthenticatedUseCases {
        &self.inner.is_authenticated
    }

    /// Record a new WebSocket client, returning the live count.
    pub fn connect_client(&self) -> usize {
        self.inner.ws_clients.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Record a disconnect, returning the live count.
    pub fn disconnect_client(&self) -> usize {
        let previous = self
            .inner
            .ws_clients
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_sub(1))
            })
            .unwrap_or_default();
        previous.saturating_sub(1)
    }

    pub fn connected_clients(&self) -> usize {
        self.inner.ws_clients.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("connected_clients", &self.connected_clients())
            .finish_non_exhaustive()
    }
}
