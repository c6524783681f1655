//! chat2edit HTTP adapter - generation trigger and progress endpoints.

mod dto;
mod handlers;
mod routes;
mod websocket;

pub use dto::{
    CycleStartedResponse, DataResponse, ErrorResponse, HealthResponse, StartGenerationRequest,
};
pub use handlers::{Chat2EditApiError, Chat2EditAppState};
pub use routes::{chat2edit_router, chat2edit_routes};
pub use websocket::WebSocketViewer;
