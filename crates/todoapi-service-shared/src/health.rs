//! Health check handlers for liveness and readiness probes.
//!
//! These sit outside the JSON:API layer and answer with plain JSON.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Body of `/health/live` and `/health/ready`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Applied schema migration (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,

    /// Open WebSocket connections (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_clients: Option<usize>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            schema_version: None,
            connected_clients: None,
        }
    }

    pub fn ready(service: &str, version: &str, schema_version: u32, clients: usize) -> Self {
        Self {
            schema_version: Some(schema_version),
            connected_clients: Some(clients),
            ..Self::alive(service, version)
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            ..Self::alive(service, version)
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Liveness probe. Always 200 while the process is serving.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"todoapi-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness probe. 503 unless the database answers a query.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"todoapi-service-shared","version":"0.1.0","schema_version":2,"connected_clients":0}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let database = state.database().clone();
    let probe = tokio::task::spawn_blocking(move || {
        database.ping()?;
        database.schema_version()
    })
    .await;

    match probe {
        Ok(Ok(schema_version)) => {
            let status =
                HealthStatus::ready(service, version, schema_version, state.connected_clients());
            (StatusCode::OK, Json(status)).into_response()
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check failed");
            let status = HealthStatus::not_ready(service, version, "database unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "readiness probe task failed");
            let status = HealthStatus::not_ready(service, version, "probe failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_state;

    #[test]
    fn test_health_status_alive() {
        let status = HealthStatus::alive("todoapi", "1.0.0");
        assert!(status.is_ok());
        assert!(status.schema_version.is_none());
        let json = serde_json::to_string(&status).unwrap();
        assert!(!json.contains("schema_version"));
    }

    #[test]
    fn test_health_status_ready() {
        let status = HealthStatus::ready("todoapi", "1.0.0", 2, 3);
        assert!(status.is_ok());
        assert_eq!(status.schema_version, Some(2));
        assert_eq!(status.connected_clients, Some(3));
    }

    #[test]
    fn test_health_status_not_ready() {
        let status = HealthStatus::not_ready("todoapi", "1.0.0", "database unavailable");
        assert!(!status.is_ok());
        assert!(status.status.contains("database unavailable"));
    }

    #[tokio::test]
    async fn test_health_live_handler() {
        let response = health_live().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_handler() {
        let response = health_ready(State(test_state())).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 4096).await.unwrap();
        let status: HealthStatus = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(status.schema_version, Some(todoapi_lib::SCHEMA_VERSION));
        assert_eq!(status.connected_clients, Some(0));
    }
}
