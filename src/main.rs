//! Posts API Proxy Server
//!
//! HTTP service that proxies and filters the public posts/comments API

use anyhow::{Context, Result};
use postproxy::config::settings::LoggingConfig;
use postproxy::utils::telemetry::telemetry_layer;
use postproxy::{create_router, version_info, Settings};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    // Settings first: they decide how logging is set up
    let settings = Settings::new().context("Failed to load server settings")?;

    init_logging(&settings.logging)?;
    info!("{}", version_info());
    info!("Server settings loaded");

    let app = create_router(settings.clone())?;

    let addr = settings.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Posts proxy server started!");
    info!("📝 Health check: http://{}/health", addr);
    info!("🔄 Posts endpoint: http://{}/posts", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start server: {}", e))?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging system
fn init_logging(config: &LoggingConfig) -> Result<()> {
    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = if config.format == "json" {
        // JSON format logs (production environment)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .boxed()
    } else {
        // Human readable format (development environment)
        fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed()
    };

    let env_filter = EnvFilter::try_new(&config.level).context("Invalid log level")?;
    let subscriber = tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .with(telemetry_layer());

    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("Logging system initialized");
    Ok(())
}

/// Resolve on Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
