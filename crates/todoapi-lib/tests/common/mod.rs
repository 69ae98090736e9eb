//! Shared fixtures for integration tests.

use std::sync::Arc;

use todoapi_lib::{
    BcryptHasher, Database, JwtConfig, JwtTokenService, LoginUseCases, PasswordHasher,
    SqliteTodoRepository, SqliteUserRepository, UserRepository,
};

/// Lowest bcrypt cost accepted by the crate; keeps tests fast.
#[allow(dead_code)]
pub const TEST_BCRYPT_COST: u32 = 4;

#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "correct horse";

#[allow(dead_code)]
pub fn memory_db() -> Arc<Database> {
    Arc::new(Database::open_in_memory().expect("open in-memory database"))
}

#[allow(dead_code)]
pub fn todo_repository(db: &Arc<Database>) -> Arc<SqliteTodoRepository> {
    Arc::new(SqliteTodoRepository::new(Arc::clone(db)))
}

#[allow(dead_code)]
pub fn user_repository(db: &Arc<Database>) -> Arc<SqliteUserRepository> {
    Arc::new(SqliteUserRepository::new(Arc::clone(db)))
}

#[allow(dead_code)]
pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "access-secret".to_string(),
        expiration_secs: 60,
        refresh_secret: "refresh-secret".to_string(),
        refresh_expiration_secs: 600,
    }
}

/// Register `username` with [`TEST_PASSWORD`].
#[allow(dead_code)]
pub fn seed_user(users: &SqliteUserRepository, username: &str) {
    let hash = BcryptHasher::new(TEST_BCRYPT_COST)
        .hash(TEST_PASSWORD)
        .expect("hash password");
    users.insert_user(username, &hash).expect("insert user");
}

/// Login use cases wired to the given repository with fast hashing.
#[allow(dead_code)]
pub fn login_usecases(users: Arc<SqliteUserRepository>) -> LoginUseCases {
    LoginUseCases::new(
        users,
        Arc::new(BcryptHasher::new(TEST_BCRYPT_COST)),
        Arc::new(JwtTokenService),
        jwt_config(),
    )
}
