//! HTTP handlers for chat2edit endpoints.
//!
//! These handlers connect Axum routes to the progress pipeline: starting a
//! cycle, polling its progress, and streaming it over a WebSocket.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::application::progress::{CycleLifecycleController, LifecycleError, ProgressRelay};
use crate::config::GenerationConfig;
use crate::domain::foundation::{CycleId, ValidationError};
use crate::domain::generation::GenerationError;
use crate::ports::EventLogError;

use super::dto::{CycleStartedResponse, DataResponse, ErrorResponse, StartGenerationRequest};
use super::websocket::WebSocketViewer;

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for chat2edit handlers.
///
/// Cloned for each request; every member is a cheap handle.
#[derive(Clone)]
pub struct Chat2EditAppState {
    pub controller: CycleLifecycleController,
    pub relay: ProgressRelay,
    pub generation: GenerationConfig,
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// POST /chat2edit/generate - Start a generation cycle
///
/// Returns 202 with the cycle id once the cycle's previous progress is
/// cleared and the run is scheduled.
pub async fn start_generation(
    State(state): State<Chat2EditAppState>,
    Json(body): Json<StartGenerationRequest>,
) -> Result<impl IntoResponse, Chat2EditApiError> {
    let cycle_id = match body.cycle_id {
        Some(raw) => CycleId::parse(raw)?,
        None => CycleId::new(),
    };

    let request = state.generation.apply_defaults(body.request);
    request.validate()?;

    // The run outlives the request; its outcome is reported as progress.
    let handle = state.controller.start(cycle_id.clone(), request).await?;
    tracing::debug!(cycle_id = %handle.cycle_id(), "Generation cycle scheduled");

    let response = DataResponse::new(CycleStartedResponse {
        cycle_id: cycle_id.to_string(),
    });
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /chat2edit/cycles/:cycle_id/progress - Full progress history
pub async fn get_progress(
    State(state): State<Chat2EditAppState>,
    Path(cycle_id): Path<String>,
) -> Result<impl IntoResponse, Chat2EditApiError> {
    let cycle_id = CycleId::parse(cycle_id)?;
    let events = state.relay.history(&cycle_id).await?;
    Ok(Json(DataResponse::new(events)))
}

/// GET /chat2edit/cycles/:cycle_id/progress/ws - Stream progress
///
/// The id is validated before the upgrade, so a bad id is a plain 400.
pub async fn progress_ws(
    ws: WebSocketUpgrade,
    State(state): State<Chat2EditAppState>,
    Path(cycle_id): Path<String>,
) -> Response {
    let cycle_id = match CycleId::parse(cycle_id) {
        Ok(id) => id,
        Err(e) => return Chat2EditApiError::from(e).into_response(),
    };

    ws.on_upgrade(move |socket| async move {
        tracing::debug!(cycle_id = %cycle_id, "Progress viewer connected");
        let mut viewer = WebSocketViewer::new(socket);
        // Outcome is logged by the relay; the socket is closed either way.
        let _ = state.relay.attach(&cycle_id, &mut viewer).await;
    })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper for chat2edit handlers.
#[derive(Debug)]
pub enum Chat2EditApiError {
    InvalidCycleId(ValidationError),
    Generation(GenerationError),
    Lifecycle(LifecycleError),
    Progress(EventLogError),
}

impl From<ValidationError> for Chat2EditApiError {
    fn from(err: ValidationError) -> Self {
        Chat2EditApiError::InvalidCycleId(err)
    }
}

impl From<GenerationError> for Chat2EditApiError {
    fn from(err: GenerationError) -> Self {
        Chat2EditApiError::Generation(err)
    }
}

impl From<LifecycleError> for Chat2EditApiError {
    fn from(err: LifecycleError) -> Self {
        Chat2EditApiError::Lifecycle(err)
    }
}

impl From<EventLogError> for Chat2EditApiError {
    fn from(err: EventLogError) -> Self {
        Chat2EditApiError::Progress(err)
    }
}

impl IntoResponse for Chat2EditApiError {
    fn into_response(self) -> Response {
        if let Chat2EditApiError::Lifecycle(e @ LifecycleError::CycleAlreadyActive(cycle_id)) = &self {
            let body = ErrorResponse::with_details(
                "CYCLE_ALREADY_ACTIVE",
                e.to_string(),
                serde_json::json!({ "cycle_id": cycle_id }),
            );
            return (StatusCode::CONFLICT, Json(body)).into_response();
        }

        let (status, error_code, message) = match &self {
            Chat2EditApiError::InvalidCycleId(e) => {
                (StatusCode::BAD_REQUEST, "INVALID_CYCLE_ID", e.to_string())
            }
            Chat2EditApiError::Generation(GenerationError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            Chat2EditApiError::Generation(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_FAILED", e.to_string())
            }
            Chat2EditApiError::Lifecycle(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GENERATION_FAILED", e.to_string())
            }
            Chat2EditApiError::Progress(e @ EventLogError::Unavailable(_)) => {
                tracing::warn!(error = %e, "Progress store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "PROGRESS_UNAVAILABLE",
                    "Progress store is unavailable".to_string(),
                )
            }
            Chat2EditApiError::Progress(e) => {
                tracing::error!(error = %e, "Failed to read progress");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROGRESS_CORRUPT",
                    "Progress history could not be read".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse::new(error_code, message))).into_response()
    }
}
