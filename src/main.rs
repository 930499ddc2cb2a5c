use anyhow::{Context, Result};
use showcase_content::{config::Config, scheduler, server, store::RestStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("showcase_content=info".parse()?),
        )
        .init();

    info!("Starting showcase content service");

    let config = Arc::new(Config::from_env()?);
    let store = Arc::new(RestStore::from_config(&config));

    // Keep the scheduler alive for the lifetime of the server
    let _scheduler = if config.audit_times.is_empty() {
        info!("No AUDIT_TIMES configured, scheduled audits disabled");
        None
    } else {
        Some(scheduler::start_scheduler(Arc::clone(&config), Arc::clone(&store)).await?)
    };

    if config.admin_api_key.is_none() {
        info!("ADMIN_API_KEY not set, admin routes are closed");
    }

    let state = Arc::new(server::AppState::new(Arc::clone(&config), store)?);
    let app = server::router(state);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("✓ Server listening on {}", address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install terminate handler: {}", e);
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
}
