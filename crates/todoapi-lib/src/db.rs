use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Todo, TodoId, User};
use crate::repository::{TodoRepository, UserRepository};

/// A single forward-only schema step, applied when `PRAGMA user_version` is
/// below `version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "create_user_and_todo",
        sql: r#"
            CREATE TABLE IF NOT EXISTS "user" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL,
                create_date TEXT NOT NULL,
                updated_date TEXT NOT NULL,
                last_login TEXT,
                hach_refresh_token TEXT
            );
            CREATE TABLE IF NOT EXISTS "todo" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                content TEXT NOT NULL,
                is_done INTEGER NOT NULL DEFAULT 0,
                created_date TEXT NOT NULL,
                updated_date TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        name: "rename_hach_refresh_token",
        sql: r#"ALTER TABLE "user" RENAME COLUMN hach_refresh_token TO hash_refresh_token;"#,
    },
];

/// Latest schema version known to this build.
pub const SCHEMA_VERSION: u32 = 2;

/// Shared SQLite handle used by every repository.
///
/// rusqlite connections are not `Sync`, so access is serialized through a
/// mutex. Cloning the surrounding `Arc` is the intended way to share it.
#[derive(Debug)]
pub struct Database {
    connection: Mutex<Connection>,
}

impl Database {
    /// Open (creating if needed) the database file and bring its schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)?;
        debug!(path = %path.display(), "opened database");
        Self::from_connection(connection)
    }

    /// Open a private in-memory database with the current schema.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> Result<Self> {
        connection.execute_batch("PRAGMA foreign_keys = ON;")?;
        let database = Self {
            connection: Mutex::new(connection),
        };
        database.migrate()?;
        Ok(database)
    }

    /// Apply every pending migration in order, each inside its own transaction.
    pub fn migrate(&self) -> Result<u32> {
        let mut connection = self.lock()?;
        let start = schema_version(&connection)?;
        let mut current = start;

        for migration in MIGRATIONS.iter().filter(|m| m.version > start) {
            let tx = connection.transaction()?;
            tx.execute_batch(migration.sql)?;
            tx.pragma_update(None, "user_version", migration.version)?;
            tx.commit()?;
            info!(
                version = migration.version,
                name = migration.name,
                "applied schema migration"
            );
            current = migration.version;
        }

        Ok(current)
    }

    /// Schema version recorded in the database file.
    pub fn schema_version(&self) -> Result<u32> {
        let connection = self.lock()?;
        schema_version(&connection)
    }

    /// Cheap liveness query used by readiness probes.
    pub fn ping(&self) -> Result<()> {
        self.lock()?.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.connection.lock().map_err(|_| Error::ConnectionPoisoned)
    }
}

fn schema_version(connection: &Connection) -> Result<u32> {
    Ok(connection.query_row("PRAGMA user_version", [], |row| row.get(0))?)
}

fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(column: &'static str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp {
            column,
            value: value.to_string(),
        })
}

/// Column values as stored; timestamps are converted after the row closure
/// so parse failures surface as library errors.
struct TodoRow {
    id: TodoId,
    content: String,
    is_done: bool,
    created_date: String,
    updated_date: String,
}

impl TodoRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            content: row.get(1)?,
            is_done: row.get(2)?,
            created_date: row.get(3)?,
            updated_date: row.get(4)?,
        })
    }

    fn into_todo(self) -> Result<Todo> {
        Ok(Todo {
            id: self.id,
            content: self.content,
            is_done: self.is_done,
            created_date: parse_timestamp("created_date", &self.created_date)?,
            updated_date: parse_timestamp("updated_date", &self.updated_date)?,
        })
    }
}

const TODO_COLUMNS: &str = "id, content, is_done, created_date, updated_date";

/// [`TodoRepository`] backed by the shared SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteTodoRepository {
    db: Arc<Database>,
}

impl SqliteTodoRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

impl TodoRepository for SqliteTodoRepository {
    fn insert(&self, content: &str) -> Result<Todo> {
        let now = Utc::now();
        let stamp = format_timestamp(now);
        let connection = self.db.lock()?;
        connection.execute(
            r#"INSERT INTO "todo" (content, is_done, created_date, updated_date) VALUES (?1, 0, ?2, ?2)"#,
            params![content, stamp],
        )?;
        let id = connection.last_insert_rowid();
        // Re-read so the returned value carries the stored (millisecond) precision.
        drop(connection);
        self.find_by_id(id)
    }

    fn find_all(&self) -> Result<Vec<Todo>> {
        let connection = self.db.lock()?;
        let mut stmt =
            connection.prepare(&format!(r#"SELECT {TODO_COLUMNS} FROM "todo" ORDER BY id"#))?;
        let rows = stmt
            .query_map([], TodoRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(TodoRow::into_todo).collect()
    }

    fn find_by_id(&self, id: TodoId) -> Result<Todo> {
        let connection = self.db.lock()?;
        let row = connection
            .query_row(
                &format!(r#"SELECT {TODO_COLUMNS} FROM "todo" WHERE id = ?1"#),
                [id],
                TodoRow::from_row,
            )
            .optional()?;
        row.ok_or(Error::TodoNotFound { id })?.into_todo()
    }

    fn update_content(&self, id: TodoId, is_done: bool) -> Result<()> {
        let connection = self.db.lock()?;
        let changed = connection.execute(
            r#"UPDATE "todo" SET is_done = ?1, updated_date = ?2 WHERE id = ?3"#,
            params![is_done, format_timestamp(Utc::now()), id],
        )?;
        if changed == 0 {
            return Err(Error::TodoNotFound { id });
        }
        Ok(())
    }

    fn delete_by_id(&self, id: TodoId) -> Result<()> {
        let connection = self.db.lock()?;
        let changed = connection.execute(r#"DELETE FROM "todo" WHERE id = ?1"#, [id])?;
        if changed == 0 {
            return Err(Error::TodoNotFound { id });
        }
        Ok(())
    }
}

struct UserRow {
    id: i64,
    username: String,
    password: String,
    create_date: String,
    updated_date: String,
    last_login: Option<String>,
    hash_refresh_token: Option<String>,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            password: row.get(2)?,
            create_date: row.get(3)?,
            updated_date: row.get(4)?,
            last_login: row.get(5)?,
            hash_refresh_token: row.get(6)?,
        })
    }

    fn into_user(self) -> Result<User> {
        let last_login = self
            .last_login
            .as_deref()
            .map(|value| parse_timestamp("last_login", value))
            .transpose()?;
        Ok(User {
            id: self.id,
            username: self.username,
            password: self.password,
            create_date: parse_timestamp("create_date", &self.create_date)?,
            updated_date: parse_timestamp("updated_date", &self.updated_date)?,
            last_login,
            hash_refresh_token: self.hash_refresh_token,
        })
    }
}

/// [`UserRepository`] backed by the shared SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteUserRepository {
    db: Arc<Database>,
}

impl SqliteUserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn touch(&self, username: &str, sql: &str, value: Option<&str>) -> Result<()> {
        let connection = self.db.lock()?;
        let changed = connection.execute(sql, params![value, format_timestamp(Utc::now()), username])?;
        if changed == 0 {
            return Err(Error::UserNotFound {
                username: username.to_string(),
            });
        }
        Ok(())
    }
}

impl UserRepository for SqliteUserRepository {
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let connection = self.db.lock()?;
        let row = connection
            .query_row(
                r#"SELECT id, username, password, create_date, updated_date, last_login, hash_refresh_token
                   FROM "user" WHERE username = ?1"#,
                [username],
                UserRow::from_row,
            )
            .optional()?;
        row.map(UserRow::into_user).transpose()
    }

    fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let stamp = format_timestamp(Utc::now());
        {
            let connection = self.db.lock()?;
            let inserted = connection.execute(
                r#"INSERT INTO "user" (username, password, create_date, updated_date)
                   VALUES (?1, ?2, ?3, ?3) ON CONFLICT(username) DO NOTHING"#,
                params![username, password_hash, stamp],
            )?;
            if inserted == 0 {
                return Err(Error::UsernameTaken {
                    username: username.to_string(),
                });
            }
        }
        self.get_user_by_username(username)?
            .ok_or_else(|| Error::UserNotFound {
                username: username.to_string(),
            })
    }

    fn update_last_login(&self, username: &str) -> Result<()> {
        let now = format_timestamp(Utc::now());
        self.touch(
            username,
            r#"UPDATE "user" SET last_login = ?1, updated_date = ?2 WHERE username = ?3"#,
            Some(&now),
        )
    }

    fn update_refresh_token(
        &self,
        username: &str,
        refresh_token_hash: Option<&str>,
    ) -> Result<()> {
        self.touch(
            username,
            r#"UPDATE "user" SET hash_refresh_token = ?1, updated_date = ?2 WHERE username = ?3"#,
            refresh_token_hash,
        )
    }
}
