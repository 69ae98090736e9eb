//! Application use cases.
//!
//! Each use case depends only on the ports in [`crate::repository`] and
//! [`crate::auth`], so HTTP handlers and the CLI drive the same logic.

mod auth;
mod todo;

pub use auth::{IsAuthenticatedUseCases, LoginUseCases, LogoutUseCases};
pub use todo::TodoUseCases;
