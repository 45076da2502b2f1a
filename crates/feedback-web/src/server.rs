//! Axum server setup and router construction.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

use crate::StubConfig;
use crate::api::{self, AppState, SubmissionLog};

/// Build the stub's router.
///
/// CORS is wide open so widgets served from a dev server on another port
/// can reach it.
pub fn build_router(config: StubConfig, log: SubmissionLog) -> Router {
    let state = AppState {
        config: Arc::new(config),
        log,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/feedback", get(api::get_feedback))
        .route("/api/submissions", get(api::get_submissions))
        .with_state(state)
        .layer(cors)
}

/// Bind, spawn the server, and return the bound address.
pub async fn start_server(router: Router, bind_addr: SocketAddr) -> std::io::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    let addr = listener.local_addr()?;
    info!("feedback stub listening on http://{addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!("feedback stub stopped: {e}");
        }
    });

    Ok(addr)
}
