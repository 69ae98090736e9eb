//! Todo and authentication HTTP service.
//!
//! See the library crate for the endpoint list.
//!
//! # Configuration
//!
//! - `JWT_SECRET`, `JWT_REFRESH_TOKEN_SECRET` - Token signing secrets (required)
//! - `JWT_EXPIRATION_TIME`, `JWT_REFRESH_TOKEN_EXPIRATION_TIME` - Lifetimes in seconds
//! - `TODOAPI_DATABASE_PATH` - SQLite file (default: todoapi.db)
//! - `SERVICE_PORT` - HTTP port (default: 3000)
//! - `BCRYPT_COST` - Password hashing cost
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text

use std::net::SocketAddr;

use tracing::{error, info};

use todoapi_service::app;
use todoapi_service_shared::{
    AppState, LoggingConfig, MetricsConfig, ServiceConfig, init_logging, init_metrics,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("todoapi");
    init_logging(&logging_config)?;

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        // Metrics are optional
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let config = ServiceConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        e
    })?;
    info!(?config, "starting todo service");

    let state = AppState::open(&config).map_err(|e| {
        error!(error = %e, path = %config.database_path.display(), "failed to load application state");
        e
    })?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
