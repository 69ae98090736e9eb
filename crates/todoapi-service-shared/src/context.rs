//! Per-request transport facts consumed by the interceptor and normalizer.

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method, Uri};

use crate::middleware::{extract_or_generate_request_id, RequestId};

const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Method, URL and timing of the request being handled.
///
/// Built once by the JSON:API layer and stored in the request extensions;
/// handlers can extract it directly.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Path and query exactly as received.
    pub original_url: String,
    /// Absolute URL of the request: `<scheme>://<host><original_url>`.
    pub self_link: String,
    pub started_at: Instant,
    pub request_id: RequestId,
}

impl RequestContext {
    /// Capture the context at the start of handling.
    ///
    /// A [`RequestId`] already present in `extensions` (set by the metrics
    /// layer) is reused so logs and responses share one id.
    pub fn capture(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        request_id: Option<&RequestId>,
    ) -> Self {
        let original_url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| uri.path().to_string());
        let self_link = format!("{}://{}{}", scheme(headers), host(uri, headers), original_url);

        Self {
            method: method.clone(),
            path: uri.path().to_string(),
            original_url,
            self_link,
            started_at: Instant::now(),
            request_id: request_id
                .cloned()
                .unwrap_or_else(|| extract_or_generate_request_id(headers)),
        }
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::capture(
            &parts.method,
            &parts.uri,
            &parts.headers,
            parts.extensions.get::<RequestId>(),
        )
    }

    /// Whole milliseconds since the request was captured.
    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_else(|| RequestContext::from_parts(parts)))
    }
}

fn scheme(headers: &HeaderMap) -> &str {
    headers
        .get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("http")
}

fn host<'a>(uri: &'a Uri, headers: &'a HeaderMap) -> &'a str {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn capture(uri: &str, headers: HeaderMap) -> RequestContext {
        let uri: Uri = uri.parse().unwrap();
        RequestContext::capture(&Method::GET, &uri, &headers, None)
    }

    #[test]
    fn test_self_link_defaults() {
        let ctx = capture("/api/v1/todo/todo?id=3", HeaderMap::new());
        assert_eq!(ctx.path, "/api/v1/todo/todo");
        assert_eq!(ctx.original_url, "/api/v1/todo/todo?id=3");
        assert_eq!(ctx.self_link, "http://localhost/api/v1/todo/todo?id=3");
    }

    #[test]
    fn test_self_link_uses_host_and_forwarded_proto() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("todo.example:3000"));
        headers.insert(FORWARDED_PROTO, HeaderValue::from_static("https, http"));
        let ctx = capture("/api/v1/todo/todos", headers);
        assert_eq!(ctx.self_link, "https://todo.example:3000/api/v1/todo/todos");
    }

    #[test]
    fn test_absolute_uri_authority_used_without_host_header() {
        let ctx = capture("http://api.local/health/live", HeaderMap::new());
        assert_eq!(ctx.self_link, "http://api.local/health/live");
    }

    #[test]
    fn test_existing_request_id_is_reused() {
        let uri: Uri = "/".parse().unwrap();
        let id = RequestId::new("req-1");
        let ctx = RequestContext::capture(&Method::POST, &uri, &HeaderMap::new(), Some(&id));
        assert_eq!(ctx.request_id, id);
        assert_eq!(ctx.method, Method::POST);
    }
}
