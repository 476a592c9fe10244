use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::broadcast;

use amayo_display_service::blocks::create_block_repository;
use amayo_display_service::config::Settings;
use amayo_display_service::points::create_points_store;
use amayo_display_service::postgres::PostgresPool;
use amayo_display_service::server::{create_app, AppState};
use amayo_display_service::tasks::SessionReaperTask;
use amayo_display_service::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing (keep the guard alive until exit)
    let _telemetry = init_telemetry(&settings.otel, &settings.logging)?;
    tracing::info!("Configuration loaded");

    // Optional PostgreSQL pool
    let postgres_pool = match &settings.database {
        Some(database) => match PostgresPool::new(database).await {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to PostgreSQL, using memory backends");
                None
            }
        },
        None => None,
    };

    let points = create_points_store(&settings.points, postgres_pool.clone());
    let blocks = create_block_repository(&settings.blocks, postgres_pool.clone());

    // Create application state
    let state = AppState::new(settings.clone(), points, blocks, postgres_pool.clone());
    tracing::info!("Application state initialized");

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Start session reaper in background
    let reaper = SessionReaperTask::new(
        state.editor.clone(),
        settings.editor.sweep_interval(),
        shutdown_tx.subscribe(),
    );
    let reaper_handle = tokio::spawn(async move {
        reaper.run().await;
    });

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_tx))
        .await?;

    // Wait for background tasks to finish
    tracing::info!("Waiting for background tasks to finish...");
    let _ = reaper_handle.await;

    if let Some(pool) = postgres_pool {
        pool.close().await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: broadcast::Sender<()>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop background tasks
    let _ = shutdown_tx.send(());
}
