mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::database::{ConnectionManager, DefaultConnector};
use crate::core::{logging, router};
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();
    logging::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(anyhow::anyhow!(e));
        }
    };

    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
        worker_threads,
        std::process::id()
    );
    tracing::info!("Configuration loaded successfully");

    let connections = Arc::new(ConnectionManager::new(Arc::new(DefaultConnector::new(
        config.mongodb.clone(),
        config.minio.clone(),
    ))));

    let report = if config.retry.enabled {
        tracing::info!(
            "Connecting to stores (max_retries={}, initial_delay={:?})",
            config.retry.max_retries,
            config.retry.initial_delay
        );
        connections.connect_with_retry(&config.retry).await
    } else {
        tracing::info!("Connecting to stores (retry disabled)");
        connections.connect().await
    };

    if report.all_connected() {
        tracing::info!("All stores connected");
    } else if report.any_connected() {
        tracing::warn!(
            "Starting with partial availability: mongodb={}, minio={}",
            report.mongodb.error.as_deref().unwrap_or("connected"),
            report.minio.error.as_deref().unwrap_or("connected")
        );
    } else {
        tracing::error!("No store could be connected; serving in unhealthy state");
    }

    let health = connections.health_check().await;
    tracing::info!(
        "Health snapshot: overall={}, mongodb={}, minio={}",
        health.status.as_str(),
        health.mongodb.status.as_str(),
        health.minio.status.as_str()
    );

    let app = router::create_router(&config, Arc::clone(&connections));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(1024 * 1024)?;
    socket.set_send_buffer_size(1024 * 1024)?;

    let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
    #[cfg(target_os = "linux")]
    let keepalive = keepalive
        .with_interval(std::time::Duration::from_secs(10))
        .with_retries(3);
    socket.set_tcp_keepalive(&keepalive)?;

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connections.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}
