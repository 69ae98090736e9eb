//! Success outcome returned by JSON:API handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::exception::ApiError;
use crate::interceptor::{HandlerOutput, JsonApiResource};

/// Result type of every JSON:API handler.
pub type ApiResult = Result<JsonApi, ApiError>;

/// A handler's successful result, rendered into a document by the JSON:API layer.
///
/// Handlers never build envelopes themselves. They return the raw shape plus
/// an optional status and resource type, and the layer does the rest.
///
/// # Example
///
/// ```
/// use axum::http::StatusCode;
/// use todoapi_service_shared::JsonApi;
///
/// let created = JsonApi::message("Login successful").with_status(StatusCode::CREATED);
/// assert_eq!(created.status(), StatusCode::CREATED);
/// ```
#[derive(Debug, Clone)]
pub struct JsonApi {
    output: HandlerOutput,
    status: StatusCode,
    resource_type: Option<String>,
}

impl JsonApi {
    pub fn new(output: HandlerOutput) -> Self {
        Self {
            output,
            status: StatusCode::OK,
            resource_type: None,
        }
    }

    /// `data: null`.
    pub fn empty() -> Self {
        Self::new(HandlerOutput::Empty)
    }

    pub fn resource<R: JsonApiResource + ?Sized>(resource: &R) -> Self {
        Self::new(HandlerOutput::resource(resource))
    }

    pub fn resources<R: JsonApiResource>(resources: &[R]) -> Self {
        Self::new(HandlerOutput::resources(resources))
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(HandlerOutput::message(message))
    }

    /// Classify any serializable value by its JSON shape.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(value).map_err(|e| ApiError::from_error(&e))?;
        Ok(Self::new(HandlerOutput::from_value(value)))
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Shorthand for `201 Created`.
    pub fn created(self) -> Self {
        self.with_status(StatusCode::CREATED)
    }

    /// Declare the resource type for this response, overriding the route registry.
    pub fn with_resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    pub fn output(&self) -> &HandlerOutput {
        &self.output
    }

    pub fn into_output(self) -> HandlerOutput {
        self.output
    }
}

impl From<HandlerOutput> for JsonApi {
    fn from(output: HandlerOutput) -> Self {
        Self::new(output)
    }
}

/// Marks the response so the JSON:API layer renders the success document.
impl IntoResponse for JsonApi {
    fn into_response(self) -> Response {
        let mut response = self.status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}
