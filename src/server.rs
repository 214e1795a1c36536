//! HTTP front end: renders the aggregated list as HTML and JSON.
//!
//! - `GET /`          - HTML page with the ordered top stories
//! - `GET /top.json`  - the same list as JSON
//! - `GET /health`    - liveness check

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};

use crate::cache::ItemCache;
use crate::top_stories::Aggregator;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) aggregator: Aggregator,
    pub(crate) cache: ItemCache,
    pub(crate) limit: usize,
}

pub(crate) fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/top.json", get(top_json))
        .route("/health", get(health))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

pub(crate) async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Serving top stories");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(e) => tracing::error!(error =? e, "Failed to listen for Ctrl-C"),
    }
}

async fn index(State(state): State<AppState>) -> Response {
    match state.aggregator.get_top_stories(state.limit).await {
        Ok(stories) => Html(crate::render::render_index(&stories)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error getting top stories");
            (
                StatusCode::BAD_GATEWAY,
                Html(crate::render::render_error(&e.to_string())),
            )
                .into_response()
        }
    }
}

async fn top_json(State(state): State<AppState>) -> Response {
    match state.aggregator.get_top_stories(state.limit).await {
        Ok(stories) => Json(stories).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Error getting top stories");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cached_items": state.cache.len(),
    }))
}
