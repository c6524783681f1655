//! Generation module - inputs, outputs and failures of a generation run.
//!
//! The agent that performs a run is an external collaborator reached
//! through [`crate::ports::GenerationTask`]; this module only defines the
//! values exchanged with it.

mod values;

pub use values::{
    AttachmentModel, Chat2EditConfig, GenerateRequest, GenerateResponse, LlmConfig, LlmProvider,
    MessageModel,
};

use thiserror::Error;

/// Failure of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("LLM provider error: {0}")]
    Provider(String),

    #[error("Execution failed: {0}")]
    Execution(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Generation task panicked: {0}")]
    Panicked(String),
}
