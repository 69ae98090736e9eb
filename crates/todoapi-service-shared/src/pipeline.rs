//! The axum layer routing every handler outcome through the interceptor or
//! the normalizer.
//!
//! ```text
//! request ──► capture RequestContext ──► handler ──► response
//!                                                      │
//!            ┌─────────────────────────────────────────┤
//!            │ ApiError extension   → ExceptionNormalizer
//!            │ JsonApi extension    → ResponseInterceptor
//!            │ other 4xx / 5xx      → ExceptionNormalizer (framework message)
//!            └ anything else        → passed through untouched
//! ```
//!
//! Handler panics are turned into an unclassified [`ApiError`] by
//! [`catch_panic_layer`], which sits inside [`jsonapi_layer`].

use std::any::Any;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::context::RequestContext;
use crate::exception::{ApiError, ErrorLogger, ExceptionNormalizer};
use crate::interceptor::{ResourceTypes, ResponseInterceptor};
use crate::jsonapi::{JsonApiDocument, JSONAPI_MEDIA_TYPE};
use crate::metrics::record_error_response;
use crate::middleware::RequestId;
use crate::response::JsonApi;

/// Largest framework error body read back as an error `detail`.
const MAX_FRAMEWORK_BODY: usize = 64 * 1024;

/// Served if a document somehow fails to serialize.
const FALLBACK_ERROR_BODY: &str =
    r#"{"errors":[{"status":"500","title":"Internal Server Error"}],"jsonapi":{"version":"1.1"}}"#;

/// Interceptor and normalizer shared by every request.
#[derive(Debug, Clone)]
pub struct JsonApiPipeline {
    interceptor: ResponseInterceptor,
    normalizer: ExceptionNormalizer,
}

impl JsonApiPipeline {
    pub fn new(resource_types: ResourceTypes, logger: Arc<dyn ErrorLogger>) -> Self {
        Self {
            interceptor: ResponseInterceptor::new(resource_types),
            normalizer: ExceptionNormalizer::new(logger),
        }
    }

    pub fn interceptor(&self) -> &ResponseInterceptor {
        &self.interceptor
    }

    pub fn normalizer(&self) -> &ExceptionNormalizer {
        &self.normalizer
    }

    /// Produce the final response for a handler's raw response.
    pub async fn complete(&self, ctx: &RequestContext, response: Response) -> Response {
        let (mut parts, body) = response.into_parts();

        if let Some(error) = parts.extensions.remove::<ApiError>() {
            return self.render_error(parts, &error, ctx);
        }

        if let Some(outcome) = parts.extensions.remove::<JsonApi>() {
            let status = outcome.status();
            let declared = outcome.resource_type().map(str::to_string);
            let document =
                self.interceptor
                    .intercept(outcome.into_output(), ctx, declared.as_deref());
            parts.status = status;
            return render(parts, &document);
        }

        if parts.status.is_client_error() || parts.status.is_server_error() {
            let message = framework_message(parts.status, body).await;
            let error = ApiError::classified(parts.status, message);
            return self.render_error(parts, &error, ctx);
        }

        Response::from_parts(parts, body)
    }

    fn render_error(
        &self,
        mut parts: axum::http::response::Parts,
        error: &ApiError,
        ctx: &RequestContext,
    ) -> Response {
        let (status, document) = self.normalizer.normalize(error, ctx);
        record_error_response(status.as_u16());
        parts.status = status;
        render(parts, &document)
    }
}

async fn framework_message(status: StatusCode, body: Body) -> String {
    let text = match to_bytes(body, MAX_FRAMEWORK_BODY).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim().to_string(),
        Err(_) => String::new(),
    };
    if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        text
    }
}

fn render(mut parts: axum::http::response::Parts, document: &JsonApiDocument) -> Response {
    let body = match serde_json::to_vec(document) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize JSON:API document");
            parts.status = StatusCode::INTERNAL_SERVER_ERROR;
            FALLBACK_ERROR_BODY.as_bytes().to_vec()
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(JSONAPI_MEDIA_TYPE),
    );
    Response::from_parts(parts, Body::from(body))
}

/// Handler for [`CatchPanicLayer`]: the panic payload becomes an unclassified error.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let payload = if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::unclassified(format!("handler panicked: {payload}")).into_response()
}

/// Catches handler panics. Must be layered before (inside) [`jsonapi_layer`].
pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_response as fn(Box<dyn Any + Send + 'static>) -> Response)
}

/// `from_fn_with_state` middleware applying the [`JsonApiPipeline`].
///
/// ```ignore
/// let app = Router::new()
///     .route("/api/v1/todo/todos", get(list_todos))
///     .layer(catch_panic_layer())
///     .layer(axum::middleware::from_fn_with_state(pipeline, jsonapi_layer));
/// ```
pub async fn jsonapi_layer(
    State(pipeline): State<Arc<JsonApiPipeline>>,
    mut request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::capture(
        request.method(),
        request.uri(),
        request.headers(),
        request.extensions().get::<RequestId>(),
    );
    request.extensions_mut().insert(ctx.clone());
    let response = next.run(request).await;
    pipeline.complete(&ctx, response).await
}
