//! Axum-based HTTP channel: serves the relay's JSON API under `/api/`.
//!
//! `run()` drives the axum event loop; the [`CancellationToken`] passed in by
//! `main` is wired to axum's graceful shutdown.
//!
//! ## URL layout
//!
//! ```text
//! POST /api/chat     one conversation turn
//! POST /api/clear    empty a conversation's history
//! GET  /api/models   configured model keys
//! GET  /api/health   provider name + tracked conversation count
//! ```
//!
//! Cross-origin requests are allowed from any origin.

mod api;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::AppError;
use crate::subsystems::chat::ChatService;

// ── Shared request state ──────────────────────────────────────────────────────

/// Axum router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone: all fields are reference-counted.
#[derive(Clone)]
pub struct AxumState {
    /// Channel identifier used in log fields.
    pub channel_id: Arc<str>,
    pub chat: Arc<ChatService>,
}

impl AxumState {
    pub fn new(channel_id: &str, chat: Arc<ChatService>) -> Self {
        Self { channel_id: Arc::from(channel_id), chat }
    }
}

// ── AxumChannel ───────────────────────────────────────────────────────────────

pub struct AxumChannel {
    channel_id: String,
    bind_addr: String,
    chat: Arc<ChatService>,
}

impl AxumChannel {
    pub fn new(
        channel_id: impl Into<String>,
        bind_addr: impl Into<String>,
        chat: Arc<ChatService>,
    ) -> Self {
        Self {
            channel_id: channel_id.into(),
            bind_addr: bind_addr.into(),
            chat,
        }
    }

    /// Bind and serve until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), AppError> {
        let Self { channel_id, bind_addr, chat } = self;
        let router = build_router(AxumState::new(&channel_id, chat));

        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::Server(format!("axum bind failed on {bind_addr}: {e}")))?;

        info!(%channel_id, %bind_addr, "axum channel listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| AppError::Server(format!("axum server error: {e}")))?;

        info!(%channel_id, "axum channel shut down");
        Ok(())
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AxumState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat",   post(api::chat))
        .route("/api/clear",  post(api::clear))
        .route("/api/models", get(api::models))
        .route("/api/health", get(api::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
