use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use schulaufgabe_core::config::AppConfig;
use schulaufgabe_infrastructure::ConfigLoader;
use schulaufgabe_server::bootstrap::{build_state, spawn_sweeper};
use schulaufgabe_server::router;

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::warn!("Received terminate signal, shutting down..."),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config: AppConfig = ConfigLoader::from_process_env()
        .load()
        .context("failed to load configuration")?;
    init_tracing(config.server.log_json);

    if config.test_mode {
        tracing::info!("[Bootstrap] TEST_MODE enabled; using mock inference and compiler");
    }

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;

    let state = build_state(&config).context("failed to initialise metrics registry")?;
    let sweeper = spawn_sweeper(&config);
    let app = router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Starting schulaufgabe backend on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(handle) = sweeper {
        handle.abort();
    }
    tracing::info!("Server shutdown complete");
    Ok(())
}
