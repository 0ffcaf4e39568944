//! HTTP listener
//!
//! Binds the configured address, serves connections concurrently, logs one
//! line per request, and drains in-flight requests on SIGINT/SIGTERM.

use std::future::Future;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use notes_core::{Config, NoteStore};

use crate::handlers::{dispatch, AppState};
use crate::routes::NOTES_RESOURCE;

/// Create the notes router
///
/// `body_timeout` bounds how long a client may take to send a request body.
pub fn create_router(state: AppState, body_timeout: Duration) -> Router {
    Router::new()
        .fallback(dispatch)
        .with_state(state.with_body_timeout(body_timeout))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(access_log))
}

/// Log method, path, remote address, status and latency of every request
async fn access_log(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        warn!(%method, %path, %remote, status, elapsed_ms, "request failed");
    } else {
        info!(%method, %path, %remote, status, elapsed_ms, "request");
    }

    response
}

/// Serve on an already-bound listener until `shutdown` resolves
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve<F>(
    listener: TcpListener,
    state: AppState,
    body_timeout: Duration,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = create_router(state, body_timeout);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("Server error")?;

    Ok(())
}

/// Open the store, bind, and serve until a termination signal
pub async fn run(config: Config) -> Result<()> {
    config.ensure_data_dir()?;

    let store = match NoteStore::open_with_config(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("Cannot open note store: {}", e);
            if let Some(hint) = e.recovery_suggestion() {
                error!("Hint: {}", hint);
            }
            return Err(e).context("Failed to open note store");
        }
    };

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    let local_addr = listener.local_addr().context("Failed to read bound address")?;

    info!(
        "Notes server listening on http://{}:{}",
        config.host,
        local_addr.port()
    );
    info!("Entry point: /{}", NOTES_RESOURCE);
    info!("Stop with Ctrl+C or: kill {}", std::process::id());

    serve(
        listener,
        AppState::new(store),
        Duration::from_secs(config.request_timeout_secs),
        shutdown_signal(),
    )
    .await?;

    info!("Server closed");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutting down, waiting for in-flight requests");
}
