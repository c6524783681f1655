//! Axum router configuration for chat2edit endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_progress, progress_ws, start_generation, Chat2EditAppState};

/// Create the chat2edit API routes.
///
/// # Routes
/// - `POST /generate` - Start a generation cycle
/// - `GET /cycles/:cycle_id/progress` - Poll the cycle's progress history
/// - `GET /cycles/:cycle_id/progress/ws` - Stream the cycle's progress
pub fn chat2edit_routes() -> Router<Chat2EditAppState> {
    Router::new()
        .route("/generate", post(start_generation))
        .route("/cycles/:cycle_id/progress", get(get_progress))
        .route("/cycles/:cycle_id/progress/ws", get(progress_ws))
}

/// Create the complete chat2edit module router, mounted at `/chat2edit`.
pub fn chat2edit_router() -> Router<Chat2EditAppState> {
    Router::new().nest("/chat2edit", chat2edit_routes())
}
