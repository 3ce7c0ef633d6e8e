//! Serve command - runs the HTTP API server

use std::net::SocketAddr;

use axum::Router;
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::observability::{create_metrics_router, init_metrics};

/// Arguments for the serve command
#[derive(Args, Clone, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Run the API server until SIGINT/SIGTERM
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = super::bootstrap()?;

    if let Some(port) = args.port {
        config.server.port = port;
    }

    let state = crate::create_app_state_with_config(&config).await?;
    let mut app: Router = create_router(state);

    if let Some(metrics) = init_metrics(&config.metrics) {
        app = app.merge(create_metrics_router(metrics));
    }

    let addr = build_socket_addr(&config)?;
    info!(
        per_client_max = config.rate_limit.per_client_max,
        global_max = config.rate_limit.global_max,
        window_ms = config.rate_limit.window_ms,
        "Starting geo gateway on {}",
        addr
    );

    let listener = TcpListener::bind(addr).await?;

    // Peer addresses feed the per-client rate limit
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}
