use anyhow::{Context, Result};
use relay::api::create_app;
use relay::config::RelayConfig;
use relay::hub::Hub;
use relay::users::UserStore;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay=info,tower_http=info".into()),
        )
        .init();

    info!("Relay starting...");

    let config = RelayConfig::from_env().context("Failed to load configuration")?;
    info!(
        bind = %config.bind_addr(),
        database = %config.users.database_path,
        outbound_buffer = config.hub.outbound_buffer,
        "Configuration loaded"
    );

    let store = Arc::new(
        UserStore::open(&config.users.database_path).context("Failed to open user store")?,
    );
    info!(users = store.count()?, "User store ready");

    let hub = Arc::new(Hub::new(config.hub.outbound_buffer));

    let app = create_app(hub, store, config.users.body_limit_bytes);
    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!(addr = %listener.local_addr()?, "Relay listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for ctrl_c signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
