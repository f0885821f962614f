use anyhow::{Context, Result};
use relay_core::RelayConfig;
use relay_telemetry::{TelemetryConfig, init_telemetry, shutdown_telemetry};
use relay_webhook::{AppState, router};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env file is normal outside local development
    dotenvy::dotenv().ok();
    init_telemetry(TelemetryConfig::from_env(
        "relay-webhook",
        env!("CARGO_PKG_VERSION"),
    ))?;

    let config = RelayConfig::from_env().context("invalid relay configuration")?;
    if config.slack_webhook_url.is_none() {
        tracing::warn!("SLACK_WEBHOOK_URL is not set; every webhook will be answered with 500");
    }
    match &config.credentials {
        Some(credentials) => {
            tracing::info!(grant = credentials.grant.as_str(), "frame.io credentials loaded")
        }
        None => tracing::warn!(
            "FRAMEIO_CLIENT_ID/FRAMEIO_CLIENT_SECRET not set; project lookups will fail"
        ),
    }

    let http = reqwest::Client::builder()
        .user_agent(concat!("frameio-slack-relay/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build http client")?;
    let app = router(AppState::from_config(&config, http));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "relay-webhook listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown_telemetry();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
