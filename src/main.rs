use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snmp_poll_gateway::config::AppConfig;
use snmp_poll_gateway::handlers::AppState;
use snmp_poll_gateway::routes::create_router;
use snmp_poll_gateway::snmp::Snmp2Connector;
use snmp_poll_gateway::Gateway;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config_path = AppConfig::default_path();
    let config = AppConfig::load(&config_path)
        .with_context(|| format!("cannot load configuration from {}", config_path))?;

    let gateway = Gateway::start(&config, Arc::new(Snmp2Connector));
    let app = create_router(AppState {
        dispatcher: gateway.dispatcher(),
    });

    let listener = TcpListener::bind(config.get_listen())
        .await
        .with_context(|| format!("cannot bind {}", config.get_listen()))?;
    info!(listen = %config.get_listen(), "polling gateway listening");

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for shutdown signal");
            return;
        }
        info!("shutdown requested");
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("HTTP server failed")?;

    gateway.shutdown().await;
    info!("polling gateway stopped");
    Ok(())
}
