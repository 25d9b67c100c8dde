//! # AI Valley server
//!
//! config → tracing → adapters → services → router → serve.

mod wiring;

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState, Metrics};
use configs::{LogFormat, LogSettings, Settings};
use services::{AppServices, ServiceOptions};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` wins over `log.level`.
fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true).with_span_list(false))
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().with_target(true)).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load configuration")?;
    init_tracing(&settings.log);

    // reqwest, lettre and sqlx all speak rustls; pin one process-wide provider.
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        tracing::debug!("rustls crypto provider already installed");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        log_format = %settings.log.format,
        "starting AI Valley"
    );

    let ports = wiring::ports(&settings).await?;
    let services = AppServices::new(
        ports,
        ServiceOptions {
            verification_ttl: chrono::Duration::minutes(settings.mail.verification_ttl_minutes),
        },
    );
    let app = router(AppState::new(services, Arc::new(Metrics::new())));

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}
