//! HTTP gateway.
//!
//! Serves:
//! - `POST /api/chat`         - one chat turn (cookie session)
//! - `POST /api/conversation` - stored history of a conversation
//! - `GET  /api/status`       - returns `{ "status": "ok" }`
//! - `GET  /api/health`       - version and uptime
//! - everything else          - the chat UI from the static directory

mod handlers;

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::chat::ChatService;

// ---------------------------------------------------------------------------
// Gateway handle
// ---------------------------------------------------------------------------

/// Handle returned by [`start_gateway`].
pub struct Gateway {
    /// Server task handle.
    pub handle: JoinHandle<()>,
    /// The address the server is actually listening on.
    pub addr: SocketAddr,
    /// Cancel to stop accepting connections and drain in-flight requests.
    pub shutdown: CancellationToken,
}

impl Gateway {
    /// Trigger graceful shutdown and wait for the server task.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.handle.await {
            error!("gateway task failed: {e}");
        }
    }
}

// ---------------------------------------------------------------------------
// Shared state injected into axum handlers
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatService,
    pub static_dir: PathBuf,
}

impl AppState {
    pub fn new(chat: ChatService, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            chat,
            static_dir: static_dir.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Server startup
// ---------------------------------------------------------------------------

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    let _ = handlers::health::STARTUP_TIME.set(std::time::Instant::now());

    let api_router = Router::new()
        .route("/status", get(handlers::health::status_handler))
        .route("/health", get(handlers::health::api_health))
        .route(
            "/chat",
            post(handlers::chat::api_chat).fallback(handlers::method_not_allowed),
        )
        .route(
            "/conversation",
            post(handlers::conversation::api_conversation).fallback(handlers::method_not_allowed),
        );

    let static_dir = state.static_dir.clone();
    Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .fallback_service(ServeDir::new(static_dir))
}

/// Start the gateway HTTP server on `addr`.
///
/// Returns a [`Gateway`] holding the server task handle and the bound
/// address (useful when `addr` uses port 0).
pub async fn start_gateway(addr: SocketAddr, state: AppState) -> std::io::Result<Gateway> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    let handle = tokio::spawn(async move {
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await });
        if let Err(e) = serve.await {
            error!("gateway server error: {e}");
        }
    });

    info!(%bound_addr, "gateway started");

    Ok(Gateway {
        handle,
        addr: bound_addr,
        shutdown,
    })
}
