//! Data Transfer Objects for chat2edit endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::generation::GenerateRequest;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Body of `POST /chat2edit/generate`.
///
/// The generation request fields sit at the top level next to the optional
/// `cycle_id`. A missing id is assigned by the server.
#[derive(Debug, Deserialize)]
pub struct StartGenerationRequest {
    #[serde(default)]
    pub cycle_id: Option<String>,
    #[serde(flatten)]
    pub request: GenerateRequest,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Envelope for successful responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Acknowledgement of a started cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleStartedResponse {
    pub cycle_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error response with details.
    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_request_reads_cycle_id_and_flattened_request() {
        let body: StartGenerationRequest = serde_json::from_value(json!({
            "cycle_id": "c1",
            "message": {"text": "make it brighter"},
            "chat2edit_config": {"max_prompt_cycles": 3}
        }))
        .unwrap();

        assert_eq!(body.cycle_id.as_deref(), Some("c1"));
        assert_eq!(body.request.message.text, "make it brighter");
        assert_eq!(body.request.chat2edit_config.max_prompt_cycles, 3);
        assert_eq!(body.request.chat2edit_config.max_llm_exchanges, 2);
    }

    #[test]
    fn start_request_without_cycle_id() {
        let body: StartGenerationRequest =
            serde_json::from_value(json!({"message": {"text": "hi"}})).unwrap();
        assert!(body.cycle_id.is_none());
    }

    #[test]
    fn data_response_wraps_payload() {
        let response = DataResponse::new(CycleStartedResponse {
            cycle_id: "c1".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"data": {"cycle_id": "c1"}})
        );
    }

    #[test]
    fn error_response_serializes_without_details_when_none() {
        let response = ErrorResponse::new("NOT_FOUND", "Not found");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("details"));
    }

    #[test]
    fn error_response_with_details_includes_details() {
        let details = json!({"cycle_id": "c1"});
        let response = ErrorResponse::with_details("CYCLE_ALREADY_ACTIVE", "busy", details.clone());
        assert_eq!(response.details, Some(details));
    }
}
