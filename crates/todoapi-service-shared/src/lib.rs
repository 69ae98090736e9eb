//! JSON:API formatting pipeline and shared HTTP infrastructure for the todo
//! service.
//!
//! - [`jsonapi`]: JSON:API document types and the [`JsonApiFormatter`]
//! - [`interceptor`]: classification and formatting of successful handler results
//! - [`exception`]: [`ApiError`] and the [`ExceptionNormalizer`]
//! - [`pipeline`]: the axum layer that applies exactly one of the two per response
//! - [`AppState`]: database and use cases shared by handlers
//! - [`health`], [`metrics`], [`logging`], [`middleware`]: operational plumbing
//! - Request DTOs with validation, session cookies, environment configuration
//!
//! # Architecture
//!
//! Handlers stay thin. They call `todoapi-lib` use cases and return an
//! [`ApiResult`]; envelopes are built only by the pipeline:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  MetricsLayer      request id, span, HTTP metrics            │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  jsonapi_layer  RequestContext ─► handler ─► envelope  │  │
//! │  │                 Ok(JsonApi)  ─► ResponseInterceptor    │  │
//! │  │                 Err(ApiError) ─► ExceptionNormalizer   │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides an in-memory [`AppState`] and a recording
//! [`ErrorLogger`]. Enable the `test-utils` feature to access it from
//! dependent crates.

#![deny(warnings)]

pub mod config;
pub mod context;
pub mod cookie;
pub mod exception;
pub mod health;
pub mod interceptor;
pub mod jsonapi;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod pipeline;
mod request;
mod response;
mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, ServiceConfig};
pub use context::RequestContext;
pub use exception::{
    title_for_status, ApiError, Classification, ErrorLogger, ExceptionNormalizer,
    TracingErrorLogger,
};
pub use health::{health_live, health_ready, HealthStatus};
pub use interceptor::{
    infer_resource_type, HandlerOutput, JsonApiResource, ResourceDescriptor, ResourceTypes,
    ResponseInterceptor,
};
pub use jsonapi::{
    Attributes, ErrorFields, JsonApiDocument, JsonApiError, JsonApiFormatter, Links,
    PrimaryData, ResourceObject, JSONAPI_MEDIA_TYPE, JSONAPI_VERSION,
};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_error_response, record_login, record_todo_mutation,
    record_ws_message, MetricsConfig, MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId};
pub use pipeline::{catch_panic_layer, jsonapi_layer, panic_response, JsonApiPipeline};
pub use request::{
    AddTodoDto, LoginDto, TodoIdQuery, UpdateTodoDto, Validate, ValidJson, ValidQuery,
};
pub use response::{ApiResult, JsonApi};
pub use state::{AppState, AppStateError};
