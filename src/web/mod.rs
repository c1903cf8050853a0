// Web server — Axum-based HTTP front for the decision pipeline.
//
// Routes:
//   POST /validate  — decide on one piece of content
//   GET  /health    — liveness
//
// CORS is wide open (any origin, any header) since callers are browsers on
// arbitrary sites. There is no caller authentication.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::pipeline::DecisionEngine;
use crate::rate_limit::RateLimiter;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
}

/// Start the Axum web server and block until it exits.
///
/// When `sweep_interval` is set, a background task evicts idle users from
/// the rate limiter on that period for as long as the server runs.
pub async fn run_server(
    engine: Arc<DecisionEngine>,
    port: u16,
    bind: &str,
    sweep_interval: Option<Duration>,
) -> Result<()> {
    if let Some(interval) = sweep_interval {
        spawn_sweeper(Arc::clone(engine.limiter()), interval);
    }

    let app = build_router(AppState { engine });

    let addr = format!("{bind}:{port}");
    info!("contentgate listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/validate", post(handlers::validate::validate_content))
        .route("/health", get(handlers::health::health))
        .fallback(not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Periodically drop users whose rate-limit window has drained.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, interval: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; nothing to sweep yet
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let evicted = limiter.sweep(Instant::now());
            if evicted > 0 {
                debug!(
                    evicted,
                    remaining = limiter.tracked_users(),
                    "Swept idle rate-limit entries"
                );
            }
        }
    })
}

async fn not_found() -> Response {
    api_error(StatusCode::NOT_FOUND, "Not found")
}

/// Typed JSON error response helper.
pub fn api_error(status: StatusCode, message: &str) -> Response {
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}
