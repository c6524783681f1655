//! GenerationTask port - The agent that performs a generation run.
//!
//! The agent is a black box that reports its progress through a
//! [`GenerationSink`] handed to it for the duration of one run. Hooks are
//! fire-and-forget: they must never block or fail the agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::generation::{GenerateRequest, GenerateResponse, GenerationError};

/// Capability object through which an agent reports lifecycle steps.
///
/// Hooks may be called concurrently from overlapping agent operations.
pub trait GenerationSink: Send + Sync {
    /// A request was sent to the LLM.
    fn on_request(&self, payload: Value);

    /// A prompt was built.
    fn on_prompt(&self, payload: Value);

    /// The LLM answered.
    fn on_answer(&self, payload: Value);

    /// Code was extracted from an answer.
    fn on_extract(&self, payload: Value);

    /// Extracted code was executed.
    fn on_execute(&self, payload: Value);
}

/// Port for running one generation.
#[async_trait]
pub trait GenerationTask: Send + Sync {
    /// Run the agent to completion, reporting progress through `sink`.
    async fn generate(
        &self,
        request: GenerateRequest,
        sink: Arc<dyn GenerationSink>,
    ) -> Result<GenerateResponse, GenerationError>;
}
