use std::net::SocketAddr;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tokio_util::sync::CancellationToken;
use tracing::{Level, error, info};

use memstore::cleanup::{join_image_reaper, spawn_image_reaper};
use memstore::cli::Cli;
use memstore::config::AppConfig;
use memstore::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match AppConfig::load(&cli) {
        Ok(config) => config,
        Err(e) => Cli::command()
            .error(clap::error::ErrorKind::ValueValidation, e)
            .exit(),
    };

    let level = if config.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(config.debug)
        .init();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to listen on {addr}"))?;

    let state = AppState::new(config.clone());
    let shutdown = CancellationToken::new();
    let reaper = spawn_image_reaper(
        state.stores.images.clone(),
        config.image_ttl(),
        config.cleanup_interval(),
        shutdown.child_token(),
    );

    let app = memstore::build_router(state);
    info!(
        "Serving RPC at http://{}{} (auth {})",
        listener.local_addr()?,
        config.server.api_root,
        if config.auth.user.is_some() { "on" } else { "off" }
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
    .await
    .context("server error")?;

    shutdown.cancel();
    join_image_reaper(reaper).await;
    info!("Good-bye.");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT; shutting down..."),
        _ = terminate => info!("Received SIGTERM; shutting down..."),
        _ = token.cancelled() => {}
    }
    token.cancel();
}
