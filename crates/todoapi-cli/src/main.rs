use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use todoapi_cli::output::{render_jsonapi, render_text};
use todoapi_lib::{
    BcryptHasher, Database, PasswordHasher, SqliteTodoRepository, SqliteUserRepository,
    TodoUseCases, UserRepository,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Todo service database utilities")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "TODOAPI_DATABASE_PATH", default_value = "todoapi.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database if needed and apply pending migrations.
    InitDb,
    /// Register a user with a bcrypt-hashed password.
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        /// bcrypt cost factor (4-31).
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST, value_parser = clap::value_parser!(u32).range(4..=31))]
        cost: u32,
    },
    /// Print every todo.
    ListTodos {
        /// Emit a JSON:API document instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::InitDb => handle_init_db(&cli.database),
        Command::CreateUser {
            username,
            password,
            cost,
        } => handle_create_user(&cli.database, &username, &password, cost),
        Command::ListTodos { json } => handle_list_todos(&cli.database, json),
    }
}

fn open_database(path: &Path) -> Result<Arc<Database>> {
    let database = Database::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;
    Ok(Arc::new(database))
}

fn handle_init_db(path: &Path) -> Result<()> {
    let database = open_database(path)?;
    let version = database
        .schema_version()
        .context("failed to read schema version")?;
    println!(
        "Database ready at {} (schema version {})",
        path.display(),
        version
    );
    Ok(())
}

fn handle_create_user(path: &Path, username: &str, password: &str, cost: u32) -> Result<()> {
    let username = username.trim();
    anyhow::ensure!(!username.is_empty(), "username must not be empty");
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    let database = open_database(path)?;
    let hash = BcryptHasher::new(cost)
        .hash(password)
        .context("failed to hash password")?;
    let user = SqliteUserRepository::new(database)
        .insert_user(username, &hash)
        .with_context(|| format!("failed to create user '{username}'"))?;
    println!("Created user {} (id {})", user.username, user.id);
    Ok(())
}

fn handle_list_todos(path: &Path, json: bool) -> Result<()> {
    let database = open_database(path)?;
    let todos = TodoUseCases::new(Arc::new(SqliteTodoRepository::new(database)))
        .list()
        .context("failed to list todos")?;

    if json {
        let document = render_jsonapi(&todos);
        println!(
            "{}",
            serde_json::to_string_pretty(&document).context("failed to encode JSON")?
        );
    } else {
        print!("{}", render_text(&todos));
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
