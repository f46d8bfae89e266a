//! Ingestion front end: an `axum` HTTP trigger exposing `POST /trigger`,
//! the Rust port of the original's stand-alone HTTP-requester plugin.

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::post;
use tokio::sync::mpsc;
use tracing::info;

use crate::core::app_state::AppState;
use crate::error_handler::{AppError, AppResult};
use crate::middleware_layer::json_extractor::json_error_mapper;
use crate::routes::trigger_review::trigger_review_route::trigger_review_route;
use reviewbot_core::ReviewRequest;

/// Builds the router. Exposed separately from [`serve`] so tests can drive
/// it with `axum::Router::oneshot` without binding a real socket.
pub fn router(dispatch_tx: mpsc::Sender<ReviewRequest>, trigger_secret: String) -> Router {
    let state = Arc::new(AppState {
        dispatch_tx,
        trigger_secret,
    });

    Router::new()
        .route("/trigger", post(trigger_review_route))
        .layer(middleware::from_fn(json_error_mapper))
        .with_state(state)
}

/// Binds `addr` and serves the ingestion API until the process is killed.
pub async fn serve(
    addr: SocketAddr,
    dispatch_tx: mpsc::Sender<ReviewRequest>,
    trigger_secret: String,
) -> AppResult<()> {
    let app = router(dispatch_tx, trigger_secret);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(AppError::Bind)?;

    info!(%addr, "ingestion api listening");

    axum::serve(listener, app).await.map_err(AppError::Server)?;

    Ok(())
}
