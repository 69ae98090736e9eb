//! Todo backend library entry points.
//!
//! This crate holds the domain model (todos and users), the persistence ports
//! and their SQLite adapters, the credential primitives (bcrypt hashing and
//! HS256 tokens), and the use cases the HTTP service and CLI drive. Higher
//! level consumers should only depend on what is exported here.
//!

#![deny(warnings)]

pub mod auth;
pub mod db;
pub mod error;
pub mod model;
pub mod repository;
pub mod usecases;

pub use auth::{
    refresh_token_fingerprint, BcryptHasher, JwtConfig, JwtTokenService, PasswordHasher,
    TokenPayload, TokenResult, TokenService,
};
pub use db::{Database, SqliteTodoRepository, SqliteUserRepository, SCHEMA_VERSION};
pub use error::{Error, Result};
pub use model::{Todo, TodoId, User, UserProfile};
pub use repository::{TodoRepository, UserRepository};
pub use usecases::{IsAuthenticatedUseCases, LoginUseCases, LogoutUseCases, TodoUseCases};
