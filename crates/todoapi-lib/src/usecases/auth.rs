use std::sync::Arc;

use tracing::{info, warn};

use crate::auth::{
    refresh_token_fingerprint, JwtConfig, PasswordHasher, TokenResult, TokenService,
};
use crate::error::{Error, Result};
use crate::model::{User, UserProfile};
use crate::repository::UserRepository;

/// Credential checks and token issuance.
#[derive(Clone)]
pub struct LoginUseCases {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    config: JwtConfig,
}

impl LoginUseCases {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        config: JwtConfig,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            config,
        }
    }

    /// Issue a short-lived access token.
    pub fn get_jwt_token(&self, username: &str) -> Result<TokenResult> {
        info!(username, "access token issued");
        let token = self.tokens.create_token(
            username,
            &self.config.secret,
            self.config.expiration_secs,
        )?;
        Ok(TokenResult {
            token,
            expires_in: self.config.expiration_secs,
        })
    }

    /// Issue a refresh token and remember its hash so it can be checked later.
    pub fn get_jwt_refresh_token(&self, username: &str) -> Result<TokenResult> {
        info!(username, "refresh token issued");
        let token = self.tokens.create_token(
            username,
            &self.config.refresh_secret,
            self.config.refresh_expiration_secs,
        )?;
        self.set_current_refresh_token(&token, username)?;
        Ok(TokenResult {
            token,
            expires_in: self.config.refresh_expiration_secs,
        })
    }

    /// Check a username/password pair. Returns `None` on any mismatch.
    pub fn validate_user_for_local_strategy(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<UserProfile>> {
        let Some(user) = self.users.get_user_by_username(username)? else {
            return Ok(None);
        };
        if !self.hasher.compare(password, &user.password)? {
            return Ok(None);
        }
        self.update_login_time(&user.username)?;
        Ok(Some(user.profile()))
    }

    pub fn validate_user_for_jwt_strategy(&self, username: &str) -> Result<Option<User>> {
        self.users.get_user_by_username(username)
    }

    pub fn update_login_time(&self, username: &str) -> Result<()> {
        self.users.update_last_login(username)
    }

    pub fn set_current_refresh_token(&self, refresh_token: &str, username: &str) -> Result<()> {
        let hashed = self.hasher.hash(&refresh_token_fingerprint(refresh_token))?;
        self.users.update_refresh_token(username, Some(&hashed))
    }

    /// The stored user, if `refresh_token` matches the hash recorded at issue time.
    pub fn get_user_if_refresh_token_matches(
        &self,
        refresh_token: &str,
        username: &str,
    ) -> Result<Option<User>> {
        let Some(user) = self.users.get_user_by_username(username)? else {
            return Ok(None);
        };
        let Some(stored) = user.hash_refresh_token.as_deref() else {
            return Ok(None);
        };
        if self
            .hasher
            .compare(&refresh_token_fingerprint(refresh_token), stored)?
        {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    /// Local strategy as a single step: the profile or `InvalidCredentials`.
    pub fn login(&self, username: &str, password: &str) -> Result<UserProfile> {
        self.validate_user_for_local_strategy(username, password)?
            .ok_or_else(|| {
                warn!(username, "login rejected");
                Error::InvalidCredentials
            })
    }

    /// Verify an access token and resolve its user.
    pub fn authenticate_access_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.check_token(token, &self.config.secret)?;
        self.validate_user_for_jwt_strategy(&claims.username)?
            .ok_or_else(|| {
                warn!(username = %claims.username, "token subject no longer exists");
                Error::UserNotFound {
                    username: claims.username,
                }
            })
    }

    /// Verify a refresh token and check it is the one last issued.
    pub fn authenticate_refresh_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.check_token(token, &self.config.refresh_secret)?;
        self.get_user_if_refresh_token_matches(token, &claims.username)?
            .ok_or_else(|| {
                warn!(username = %claims.username, "refresh token does not match");
                Error::RefreshTokenMismatch
            })
    }
}

impl std::fmt::Debug for LoginUseCases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginUseCases")
            .field("expiration_secs", &self.config.expiration_secs)
            .field("refresh_expiration_secs", &self.config.refresh_expiration_secs)
            .finish_non_exhaustive()
    }
}

/// Invalidates the stored refresh token so it cannot mint new access tokens.
#[derive(Clone)]
pub struct LogoutUseCases {
    users: Arc<dyn UserRepository>,
}

impl LogoutUseCases {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn execute(&self, username: &str) -> Result<()> {
        self.users.update_refresh_token(username, None)?;
        info!(username, "user logged out");
        Ok(())
    }
}

/// Resolves the profile of the currently authenticated user.
#[derive(Clone)]
pub struct IsAuthenticatedUseCases {
    users: Arc<dyn UserRepository>,
}

impl IsAuthenticatedUseCases {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub fn execute(&self, username: &str) -> Result<UserProfile> {
        self.users
            .get_user_by_username(username)?
            .map(|user| user.profile())
            .ok_or_else(|| Error::UserNotFound {
                username: username.to_string(),
            })
    }
}
