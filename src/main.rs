//! Bookstore Server - book and author catalog
//!
//! Binary entry point: configuration, logging, storage and HTTP serving.

use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use bookstore_server::{
    api,
    config::{AppConfig, LoggingConfig},
    repository::{BookRepository, BooksRepository},
    services::Services,
    store::{MemoryStore, PgStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config.logging)?;

    tracing::info!("Starting Bookstore Server v{}", env!("CARGO_PKG_VERSION"));

    let repository = build_repository(&config).await?;
    let services = Services::new(repository);

    let addr = config.bind_address();
    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };

    // Build router
    let app = api::create_router(state)?;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Stdout logging plus an optional JSON log file
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("bookstore_server={},tower_http=debug", logging.level).into()
    });

    let stdout = match logging.format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().boxed(),
        _ => tracing_subscriber::fmt::layer().boxed(),
    };

    let (file, guard) = if logging.directory.is_empty() {
        (None, None)
    } else {
        let appender = tracing_appender::rolling::daily(&logging.directory, "app.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_ansi(false)
            .with_writer(writer);
        (Some(layer), Some(guard))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout)
        .with(file)
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(guard)
}

async fn build_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn BookRepository>> {
    let repository: Arc<dyn BookRepository> = match config.database.driver.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(BooksRepository::new(MemoryStore::new()))
        }
        _ => {
            // Create database connection pool
            let store = PgStore::connect(&config.database)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");

            store
                .sync_schema()
                .await
                .context("Failed to synchronize database schema")?;
            tracing::info!("Database schema synchronized");

            Arc::new(BooksRepository::new(store))
        }
    };
    Ok(repository)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
