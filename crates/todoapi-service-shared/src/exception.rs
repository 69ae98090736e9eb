//! Error-path envelope building.
//!
//! Every failure reaching the HTTP boundary is an [`ApiError`]: either
//! classified (explicit status, message and optional code) or unclassified
//! (anything else, reported as a 500). The [`ExceptionNormalizer`] turns one
//! into a JSON:API error document and logs it exactly once through an
//! injected [`ErrorLogger`].

use std::backtrace::Backtrace;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;

use todoapi_lib::Error as LibError;

use crate::context::RequestContext;
use crate::interceptor::now_timestamp;
use crate::jsonapi::{ErrorFields, ErrorSource, JsonApiDocument, JsonApiFormatter, Links, Meta};

/// Failure of a request, as seen by the HTTP boundary.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// A failure with a known HTTP status, e.g. a missing todo.
    #[error("{message}")]
    Classified {
        status: StatusCode,
        message: String,
        code: Option<String>,
    },

    /// Anything else. Always reported as 500. `trace` is logged, never sent.
    #[error("{message}")]
    Unclassified {
        message: String,
        trace: Option<String>,
    },
}

impl ApiError {
    pub fn classified(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Classified {
            status,
            message: message.into(),
            code: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::classified(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::classified(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::classified(StatusCode::NOT_FOUND, message)
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        ApiError::Unclassified {
            message: message.into(),
            trace: Some(capture_backtrace()),
        }
    }

    /// Unclassified error from any `std::error::Error`, keeping its source chain.
    pub fn from_error(error: &(dyn std::error::Error + 'static)) -> Self {
        let mut lines = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            lines.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        lines.push(capture_backtrace());
        ApiError::Unclassified {
            message: error.to_string(),
            trace: Some(lines.join("\n")),
        }
    }

    /// Attach a machine-readable code. No effect on unclassified errors.
    pub fn with_code(self, new_code: impl Into<String>) -> Self {
        match self {
            ApiError::Classified {
                status, message, ..
            } => ApiError::Classified {
                status,
                message,
                code: Some(new_code.into()),
            },
            other => other,
        }
    }

    /// Status, message, code and trace as they will be reported.
    ///
    /// A classified error whose status is not a client or server error is
    /// degraded to an unclassified 500. Every 5xx classification carries a
    /// trace; 4xx classifications never do.
    pub fn classify(&self) -> Classification {
        match self {
            ApiError::Classified {
                status,
                message,
                code,
            } if status.is_client_error() => Classification {
                status: *status,
                message: message.clone(),
                code: code.clone(),
                trace: None,
            },
            ApiError::Classified {
                status,
                message,
                code,
            } if status.is_server_error() => Classification {
                status: *status,
                message: message.clone(),
                code: code.clone(),
                trace: Some(capture_backtrace()),
            },
            ApiError::Classified { status, message, .. } => Classification {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: message.clone(),
                code: None,
                trace: Some(format!(
                    "classified with non-error status {status}\n{}",
                    capture_backtrace()
                )),
            },
            ApiError::Unclassified { message, trace } => Classification {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: message.clone(),
                code: None,
                trace: Some(trace.clone().unwrap_or_else(capture_backtrace)),
            },
        }
    }
}

/// Stack trace of the caller, regardless of `RUST_BACKTRACE`.
fn capture_backtrace() -> String {
    Backtrace::force_capture().to_string()
}

impl From<LibError> for ApiError {
    fn from(error: LibError) -> Self {
        let status = match &error {
            LibError::TodoNotFound { .. } => StatusCode::NOT_FOUND,
            LibError::UserNotFound { .. }
            | LibError::InvalidCredentials
            | LibError::RefreshTokenMismatch
            | LibError::InvalidToken { .. } => StatusCode::UNAUTHORIZED,
            LibError::Validation { .. } => StatusCode::BAD_REQUEST,
            LibError::UsernameTaken { .. } => StatusCode::CONFLICT,
            _ => return ApiError::from_error(&error),
        };
        let classified = ApiError::classified(status, error.to_string());
        match error.code() {
            Some(code) => classified.with_code(code),
            None => classified,
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        ApiError::from_error(&error)
    }
}

/// Marks the response so the JSON:API layer renders the error document.
///
/// Without the layer the response carries only the status.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = self.classify().status.into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Reported view of an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub status: StatusCode,
    pub message: String,
    pub code: Option<String>,
    pub trace: Option<String>,
}

/// Title for an error status.
pub fn title_for_status(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Error",
    }
}

/// Logging capability used on the error path.
pub trait ErrorLogger: Send + Sync {
    fn warn(&self, context: &str, message: &str);
    fn error(&self, context: &str, message: &str, trace: Option<&str>);
}

/// [`ErrorLogger`] emitting `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorLogger;

impl ErrorLogger for TracingErrorLogger {
    fn warn(&self, context: &str, message: &str) {
        tracing::warn!(context, "{message}");
    }

    fn error(&self, context: &str, message: &str, trace: Option<&str>) {
        tracing::error!(context, trace = trace.unwrap_or(""), "{message}");
    }
}

/// Turns an [`ApiError`] into a logged JSON:API error document.
#[derive(Clone)]
pub struct ExceptionNormalizer {
    formatter: JsonApiFormatter,
    logger: Arc<dyn ErrorLogger>,
}

impl ExceptionNormalizer {
    pub fn new(logger: Arc<dyn ErrorLogger>) -> Self {
        Self {
            formatter: JsonApiFormatter,
            logger,
        }
    }

    /// Classify, format and log `error`, returning the status to emit and the document.
    pub fn normalize(&self, error: &ApiError, ctx: &RequestContext) -> (StatusCode, JsonApiDocument) {
        let Classification {
            status,
            message,
            code,
            trace,
        } = error.classify();
        let timestamp = now_timestamp();

        let mut error_meta = Meta::new();
        error_meta.insert("timestamp".to_string(), Value::String(timestamp.clone()));
        error_meta.insert("path".to_string(), Value::String(ctx.original_url.clone()));

        let mut fields = ErrorFields::new()
            .status(status.as_u16())
            .title(title_for_status(status))
            .detail(message.clone())
            .source(ErrorSource::pointer(ctx.original_url.clone()))
            .meta(error_meta);
        if let Some(code) = &code {
            fields = fields.code(code);
        }

        let mut meta = Meta::new();
        meta.insert("timestamp".to_string(), Value::String(timestamp));
        let document = self.formatter.format_error_response(
            vec![self.formatter.create_error(fields)],
            Some(meta),
            Some(Links::self_link(ctx.self_link.clone())),
        );

        let context = format!("End Request for {}", ctx.path);
        let line = format!(
            "method={} status={} code_error={} message={}",
            ctx.method,
            status.as_u16(),
            code.as_deref().unwrap_or("null"),
            message
        );
        if status.is_server_error() {
            self.logger.error(&context, &line, trace.as_deref());
        } else {
            self.logger.warn(&context, &line);
        }

        (status, document)
    }
}

impl std::fmt::Debug for ExceptionNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExceptionNormalizer").finish_non_exhaustive()
    }
}
