use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use miso_api::config::ServerConfig;
use miso_api::router::build_app_router;
use miso_api::state::{AppState, Collaborators};
use miso_pipeline::generation::{GeminiClient, TextGenerator};

/// Recorded on missions that were `running` when the previous process exited.
const ORPHANED_RUN_ERROR: &str = "Mission interrupted by server restart";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "miso_api=debug,miso_pipeline=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        policy_bypass = config.policy_bypass,
        "Loaded server configuration",
    );

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = miso_db::create_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    miso_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    miso_db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database ready");

    // --- Recovery ---
    let orphaned =
        miso_db::repositories::MissionRepo::fail_orphaned_running(&pool, ORPHANED_RUN_ERROR)
            .await
            .context("Failed to recover orphaned missions")?;
    if !orphaned.is_empty() {
        tracing::warn!(count = orphaned.len(), ids = ?orphaned, "Failed orphaned missions");
    }

    // --- Generation capability ---
    let generator: Option<Arc<dyn TextGenerator>> = match config.gemini() {
        Some(gemini) => {
            tracing::info!(model = %gemini.model, "Local generation enabled");
            Some(Arc::new(GeminiClient::new(gemini)?) as Arc<dyn TextGenerator>)
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set: MISO_AI agents and policy review unavailable");
            None
        }
    };

    // --- App state ---
    let state = AppState::new(
        pool,
        config.clone(),
        Collaborators::from_generator(generator),
    )?;
    let resumed = state
        .resume_pending()
        .await
        .context("Failed to resume pending missions")?;
    if !resumed.is_empty() {
        tracing::info!(count = resumed.len(), ids = ?resumed, "Resumed pending missions");
    }

    let runner = Arc::clone(&state.runner);
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid HOST address")?,
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, draining mission runs");
    if runner.shutdown(config.shutdown_timeout()).await {
        tracing::info!("All mission runs finished");
    } else {
        tracing::warn!("Mission runs aborted; they will be failed on next startup");
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
