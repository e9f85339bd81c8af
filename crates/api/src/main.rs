use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_api::config::ServerConfig;
use relay_api::router::{build_app_router, build_ws_router};
use relay_api::state::AppState;
use relay_api::ws;
use relay_store::{InMemoryStore, Store};
use relay_worker::{JobScheduler, JobWorker};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    init_tracing();

    // --- Configuration ---
    let config = ServerConfig::from_env()?;
    tracing::info!(
        host = %config.host,
        http_port = config.http_port,
        ws_port = config.ws_port,
        "Loaded server configuration",
    );

    // --- Store ---
    let store: Arc<dyn Store> = Arc::new(InMemoryStore::new());

    // --- WebSocket hub ---
    let hub = Arc::new(ws::ChatHub::new(Arc::clone(&store)));
    let cancel = CancellationToken::new();
    let heartbeat_handle =
        ws::start_heartbeat(Arc::clone(&hub), config.heartbeat_interval, cancel.clone());

    // --- Job scheduler ---
    let worker = JobWorker::new(Arc::clone(&store)).with_processing_delay(config.processing_delay);
    let scheduler =
        JobScheduler::new(Arc::clone(&store), worker).with_tick_interval(config.scheduler_tick);
    let scheduler_cancel = cancel.clone();
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run(scheduler_cancel).await;
    });

    // --- App state ---
    let state = AppState {
        store,
        hub: Arc::clone(&hub),
    };

    let http_app = build_app_router(state.clone(), &config);
    let ws_app = build_ws_router(state);

    // --- Listeners ---
    let http_addr = bind_addr(&config.host, config.http_port)?;
    let ws_addr = bind_addr(&config.host, config.ws_port)?;

    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {http_addr}"))?;
    tracing::info!(%http_addr, "HTTP server started");

    let ws_listener = tokio::net::TcpListener::bind(ws_addr)
        .await
        .with_context(|| format!("Failed to bind WebSocket listener on {ws_addr}"))?;
    tracing::info!(%ws_addr, "WebSocket server started");

    // --- Shutdown trigger ---
    let signal_cancel = cancel.clone();
    let signal_hub = Arc::clone(&hub);
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_cancel.cancel();
        signal_hub.shutdown_all().await;
    });

    let http_server = axum::serve(http_listener, http_app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .into_future();
    let ws_server = axum::serve(ws_listener, ws_app)
        .with_graceful_shutdown(cancel.clone().cancelled_owned())
        .into_future();

    tokio::try_join!(http_server, ws_server).context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Servers stopped accepting connections, cleaning up");

    let _ = tokio::time::timeout(Duration::from_secs(5), scheduler_handle).await;
    tracing::info!("Job scheduler stopped");

    heartbeat_handle.abort();
    tracing::info!("Heartbeat task stopped");

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "relay_api=debug,relay_worker=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn bind_addr(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let ip = host
        .parse()
        .with_context(|| format!("Invalid HOST address '{host}'"))?;
    Ok(SocketAddr::new(ip, port))
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix). In-flight jobs and
/// stored messages are discarded.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
