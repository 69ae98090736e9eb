//! Service configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `JWT_SECRET` | required |
//! | `JWT_EXPIRATION_TIME` | `1800` (seconds) |
//! | `JWT_REFRESH_TOKEN_SECRET` | required |
//! | `JWT_REFRESH_TOKEN_EXPIRATION_TIME` | `86400` (seconds) |
//! | `TODOAPI_DATABASE_PATH` | `todoapi.db` |
//! | `SERVICE_PORT` | `3000` |
//! | `BCRYPT_COST` | bcrypt's default cost |

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use todoapi_lib::JwtConfig;

pub const DEFAULT_ACCESS_EXPIRATION_SECS: u64 = 1800;
pub const DEFAULT_REFRESH_EXPIRATION_SECS: u64 = 86_400;
pub const DEFAULT_DATABASE_PATH: &str = "todoapi.db";
pub const DEFAULT_PORT: u16 = 3000;

/// bcrypt accepts costs in this range.
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {name}")]
    Missing { name: &'static str },

    #[error("invalid value '{value}' for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the service binary needs to start.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub jwt: JwtConfig,
    pub database_path: PathBuf,
    pub port: u16,
    pub bcrypt_cost: u32,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = required(&lookup, "JWT_SECRET")?;
        let refresh_secret = required(&lookup, "JWT_REFRESH_TOKEN_SECRET")?;
        let expiration_secs =
            parsed(&lookup, "JWT_EXPIRATION_TIME", DEFAULT_ACCESS_EXPIRATION_SECS)?;
        let refresh_expiration_secs = parsed(
            &lookup,
            "JWT_REFRESH_TOKEN_EXPIRATION_TIME",
            DEFAULT_REFRESH_EXPIRATION_SECS,
        )?;
        let port = parsed(&lookup, "SERVICE_PORT", DEFAULT_PORT)?;
        let bcrypt_cost = parsed(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !BCRYPT_COST_RANGE.contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }
        let database_path = lookup("TODOAPI_DATABASE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH));

        Ok(Self {
            jwt: JwtConfig {
                secret,
                expiration_secs,
                refresh_secret,
                refresh_expiration_secs,
            },
            database_path,
            port,
            bcrypt_cost,
        })
    }
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("database_path", &self.database_path)
            .field("port", &self.port)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("access_expiration_secs", &self.jwt.expiration_secs)
            .field("refresh_expiration_secs", &self.jwt.refresh_expiration_secs)
            .finish_non_exhaustive()
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing { name })
}

fn parsed<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        }),
    }
}
