//! Integration tests for the operator CLI.
//!
//! Each test works on its own database inside a `TempDir`.

use std::path::PathBuf;
use std::sync::Arc;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use todoapi_lib::{
    Database, SqliteTodoRepository, SqliteUserRepository, TodoRepository, UserRepository,
    SCHEMA_VERSION,
};

struct TestEnv {
    _temp_dir: TempDir,
    db_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("todo.db");
        Self {
            _temp_dir: temp_dir,
            db_path,
        }
    }

    fn cli(&self) -> Command {
        let mut cmd = Command::cargo_bin("todoapi-cli").expect("binary exists");
        cmd.arg("--database").arg(&self.db_path);
        cmd
    }

    fn database(&self) -> Arc<Database> {
        Arc::new(Database::open(&self.db_path).expect("open database"))
    }
}

#[test]
fn test_init_db_reports_schema_version() {
    let env = TestEnv::new();
    env.cli()
        .arg("init-db")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "schema version {SCHEMA_VERSION}"
        )));
    assert!(env.db_path.exists());
}

#[test]
fn test_database_path_from_env() {
    let env = TestEnv::new();
    Command::cargo_bin("todoapi-cli")
        .expect("binary exists")
        .env("TODOAPI_DATABASE_PATH", &env.db_path)
        .arg("init-db")
        .assert()
        .success();
    assert!(env.db_path.exists());
}

#[test]
fn test_create_user_hashes_password() {
    let env = TestEnv::new();
    env.cli()
        .args(["create-user", "--username", "alice", "--password", "s3cret", "--cost", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created user alice"));

    let user = SqliteUserRepository::new(env.database())
        .get_user_by_username("alice")
        .unwrap()
        .expect("user stored");
    assert_ne!(user.password, "s3cret");
    assert!(user.password.starts_with("$2"));
}

#[test]
fn test_create_duplicate_user_fails() {
    let env = TestEnv::new();
    let args = ["create-user", "--username", "bob", "--password", "pw", "--cost", "4"];
    env.cli().args(args).assert().success();
    env.cli()
        .args(args)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already taken"));
}

#[test]
fn test_create_user_rejects_low_cost() {
    let env = TestEnv::new();
    env.cli()
        .args(["create-user", "--username", "c", "--password", "pw", "--cost", "2"])
        .assert()
        .failure();
}

#[test]
fn test_list_todos_text_and_json() {
    let env = TestEnv::new();
    {
        let todos = SqliteTodoRepository::new(env.database());
        let first = todos.insert("buy milk").unwrap();
        todos.insert("walk dog").unwrap();
        todos.update_content(first.id, true).unwrap();
    }

    env.cli()
        .arg("list-todos")
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] 1    buy milk"))
        .stdout(predicate::str::contains("[ ] 2    walk dog"));

    let output = env
        .cli()
        .args(["list-todos", "--json"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["data"][0]["type"], "todos");
    assert_eq!(value["data"][1]["attributes"]["content"], "walk dog");
    assert_eq!(value["meta"]["count"], 2);
}

#[test]
fn test_list_todos_on_empty_database() {
    let env = TestEnv::new();
    env.cli()
        .arg("list-todos")
        .assert()
        .success()
        .stdout(predicate::str::contains("No todos."));
}
