//! Stockroom Server: HTTP API, HTML pages and process wiring.
//!
//! The library half builds the [`axum::Router`] so integration tests can
//! drive it in-process; `main.rs` only loads configuration and serves it.

pub mod bootstrap;
pub mod config;
pub mod cookies;
pub mod dto;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

pub use state::{AppSettings, AppState};

/// Pages at the root, the JSON API under `/api`, and `/health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::pages::router())
        .nest("/api", routes::api_router())
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
