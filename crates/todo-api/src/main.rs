//! todo-api binary entry point.

use std::sync::Arc;

use anyhow::Context;
use infrastructure::{DynamoDbClient, DynamoDbTodoStore, InMemoryTodoStore, TodoStore};
use shared::{init_tracing, Config, StoreBackend};
use todo_api::{app, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    init_tracing(config.log_format)
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing: {e}"))?;

    let store = build_store(&config).await?;
    store
        .ping()
        .await
        .context("todo store is not reachable")?;

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, environment = %config.environment, "Todo API server listening");

    let router = app(AppState::new(store), &config);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Todo API server stopped");
    Ok(())
}

/// Opens the configured store once for the lifetime of the process.
async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn TodoStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            warn!("Using in-memory store; todos are lost when the process exits");
            Ok(Arc::new(InMemoryTodoStore::new()))
        }
        StoreBackend::DynamoDb => {
            let client = DynamoDbClient::new(config).await;
            if config.dynamodb_endpoint.is_some() {
                client
                    .create_table_if_missing()
                    .await
                    .context("failed to prepare local DynamoDB table")?;
            }
            info!(table = %client.table_name(), "Using DynamoDB store");
            Ok(Arc::new(DynamoDbTodoStore::new(client)))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
