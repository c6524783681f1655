//! HTTP adapters - REST and WebSocket API.
//!
//! [`app_router`] assembles the full application: chat2edit routes, the
//! health check, and the tower-http middleware stack.

pub mod chat2edit;

pub use chat2edit::{chat2edit_router, Chat2EditAppState};

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use chat2edit::HealthResponse;

/// GET /health - Liveness probe
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Build the CORS layer from the configured origins.
///
/// With no origins configured, any origin is allowed outside production and
/// none in production.
pub fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if !origins.is_empty() {
        layer.allow_origin(origins)
    } else if server.is_production() {
        layer
    } else {
        layer.allow_origin(Any)
    }
}

/// Create the application router with all routes and middleware.
pub fn app_router(state: Chat2EditAppState, server: &ServerConfig) -> Router {
    Router::new()
        .merge(chat2edit_router())
        .route("/health", get(health))
        .with_state(state)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(cors_layer(server))
        .layer(TraceLayer::new_for_http())
}
