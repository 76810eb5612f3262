//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use crate::api::middleware::cors_layer;
use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::Database;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!(env = %config.app_env, "Starting server...");

    // Connect and apply pending migrations
    let db = Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Database initialization failed: {}", e)))?;

    let app_state = AppState::from_database(Arc::new(db));

    let app = create_router(app_state).layer(cors_layer(&config.cors_origins));

    let addr = bind_addr(&args, &config);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Command-line overrides win over the configured host and port.
fn bind_addr(args: &ServeArgs, config: &Config) -> String {
    let host = args.host.as_deref().unwrap_or(&config.server_host);
    let port = args.port.unwrap_or(config.server_port);
    format!("{}:{}", host, port)
}

/// Resolve when the process receives Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
