//! Request bodies, query parameters and their validation.

use axum::extract::{FromRequest, FromRequestParts, Json, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use todoapi_lib::TodoId;

use crate::exception::ApiError;

/// Validation trait for request types.
///
/// Implementations check every field and return a 400 [`ApiError`] for the
/// first invalid one.
pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!(
            "The '{field}' field is required and cannot be empty"
        )));
    }
    Ok(())
}

/// Credentials posted to `/auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginDto {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginDto")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Validate for LoginDto {
    fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("username", &self.username)?;
        require_non_empty("password", &self.password)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddTodoDto {
    pub content: String,
}

impl Validate for AddTodoDto {
    fn validate(&self) -> Result<(), ApiError> {
        require_non_empty("content", &self.content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTodoDto {
    pub id: TodoId,
    #[serde(rename = "isDone")]
    pub is_done: bool,
}

impl Validate for UpdateTodoDto {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// `?id=` on single-todo routes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TodoIdQuery {
    pub id: TodoId,
}

impl Validate for TodoIdQuery {
    fn validate(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// JSON body extractor that runs [`Validate`].
///
/// Malformed bodies keep axum's rejection status and message, so they reach
/// the client as normalized errors.
#[derive(Debug, Clone)]
pub struct ValidJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::classified(rejection.status(), rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}

/// Query string extractor that runs [`Validate`].
#[derive(Debug, Clone)]
pub struct ValidQuery<T>(pub T);

impl<S, T> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::classified(rejection.status(), rejection.body_text()))?;
        value.validate()?;
        Ok(Self(value))
    }
}
