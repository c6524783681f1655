//! Scripted generation task.
//!
//! Deterministic stand-in for the LLM agent. Each prompt cycle reports
//! `prompt`, `answer`, `extract` and `execute` through the sink, optionally
//! pausing between steps. When object storage is configured the task loads
//! the request's context file and uploads the updated context, the same way
//! the real agent round-trips its execution context.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::domain::generation::{GenerateRequest, GenerateResponse, GenerationError, MessageModel};
use crate::ports::{GenerationSink, GenerationTask, ObjectStorage};

/// Deterministic generation task for demos and tests.
#[derive(Clone, Default)]
pub struct ScriptedGenerationTask {
    prompt_cycles: Option<u32>,
    step_delay: Duration,
    failure: Option<String>,
    storage: Option<Arc<dyn ObjectStorage>>,
}

impl ScriptedGenerationTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of prompt cycles to run, capped by the request's
    /// `max_prompt_cycles`. Defaults to one.
    pub fn with_prompt_cycles(mut self, cycles: u32) -> Self {
        self.prompt_cycles = Some(cycles);
        self
    }

    /// Pause between consecutive hooks.
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Fail with an execution error after the last prompt cycle.
    pub fn fail_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    async fn pause(&self) {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }

    async fn load_context(
        &self,
        request: &GenerateRequest,
    ) -> Result<Map<String, Value>, GenerationError> {
        let (Some(storage), Some(file_id)) = (&self.storage, &request.context_file_id) else {
            return Ok(Map::new());
        };

        let bytes = storage
            .download(file_id)
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()))?;

        serde_json::from_slice(&bytes)
            .map_err(|e| GenerationError::Storage(format!("invalid context file: {}", e)))
    }

    async fn save_context(
        &self,
        context: &Map<String, Value>,
    ) -> Result<Option<String>, GenerationError> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };

        let bytes = serde_json::to_vec(context)
            .map_err(|e| GenerationError::Storage(e.to_string()))?;
        let id = storage
            .upload(bytes, "context.json")
            .await
            .map_err(|e| GenerationError::Storage(e.to_string()))?;

        Ok(Some(id))
    }
}

#[async_trait]
impl GenerationTask for ScriptedGenerationTask {
    async fn generate(
        &self,
        request: GenerateRequest,
        sink: Arc<dyn GenerationSink>,
    ) -> Result<GenerateResponse, GenerationError> {
        request.validate()?;

        let mut context = self.load_context(&request).await?;
        let cycles = self
            .prompt_cycles
            .unwrap_or(1)
            .min(request.chat2edit_config.max_prompt_cycles);
        let text = request.message.text.clone();
        let mut blocks = Vec::new();

        for cycle in 1..=cycles {
            sink.on_prompt(json!({ "cycle": cycle, "prompt": text }));
            self.pause().await;

            let code = format!("respond(text={:?})", text);
            sink.on_answer(json!({ "cycle": cycle, "answer": format!("```python\n{}\n```", code) }));
            self.pause().await;

            sink.on_extract(json!({ "cycle": cycle, "code": code }));
            self.pause().await;

            sink.on_execute(json!({ "cycle": cycle, "block": code, "ok": true }));
            self.pause().await;

            blocks.push(code);
        }

        if let Some(message) = &self.failure {
            return Err(GenerationError::Execution(message.clone()));
        }

        let turns = context
            .get("turns")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        context.insert("turns".to_string(), json!(turns + 1));
        let context_file_id = self.save_context(&context).await?;

        Ok(GenerateResponse {
            message: MessageModel {
                text: format!("Done: {}", text),
                attachments: request.message.attachments.clone(),
            },
            cycle: Some(json!({
                "request": request.summary(),
                "blocks": blocks,
            })),
            context_file_id,
        })
    }
}

impl std::fmt::Debug for ScriptedGenerationTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedGenerationTask")
            .field("prompt_cycles", &self.prompt_cycles)
            .field("step_delay", &self.step_delay)
            .field("failure", &self.failure)
            .field("storage", &self.storage.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryObjectStorage;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        hooks: Mutex<Vec<(&'static str, Value)>>,
    }

    impl RecordingSink {
        fn names(&self) -> Vec<&'static str> {
            self.hooks.lock().unwrap().iter().map(|(name, _)| *name).collect()
        }

        fn record(&self, name: &'static str, payload: Value) {
            self.hooks.lock().unwrap().push((name, payload));
        }
    }

    impl GenerationSink for RecordingSink {
        fn on_request(&self, payload: Value) {
            self.record("request", payload);
        }

        fn on_prompt(&self, payload: Value) {
            self.record("prompt", payload);
        }

        fn on_answer(&self, payload: Value) {
            self.record("answer", payload);
        }

        fn on_extract(&self, payload: Value) {
            self.record("extract", payload);
        }

        fn on_execute(&self, payload: Value) {
            self.record("execute", payload);
        }
    }

    #[tokio::test]
    async fn reports_hooks_for_each_prompt_cycle() {
        let sink = Arc::new(RecordingSink::default());
        let task = ScriptedGenerationTask::new().with_prompt_cycles(2);

        let response = task
            .generate(GenerateRequest::from_text("flip the cat"), sink.clone())
            .await
            .unwrap();

        assert_eq!(
            sink.names(),
            vec![
                "prompt", "answer", "extract", "execute", "prompt", "answer", "extract", "execute"
            ]
        );
        assert_eq!(response.message.text, "Done: flip the cat");
        assert_eq!(response.cycle.unwrap()["blocks"].as_array().unwrap().len(), 2);
        assert!(response.context_file_id.is_none());
    }

    #[tokio::test]
    async fn prompt_cycles_are_capped_by_request_limit() {
        let sink = Arc::new(RecordingSink::default());
        let task = ScriptedGenerationTask::new().with_prompt_cycles(10);
        let mut request = GenerateRequest::from_text("hi");
        request.chat2edit_config.max_prompt_cycles = 3;

        task.generate(request, sink.clone()).await.unwrap();

        assert_eq!(sink.names().iter().filter(|n| **n == "prompt").count(), 3);
    }

    #[tokio::test]
    async fn configured_failure_is_returned_after_steps() {
        let sink = Arc::new(RecordingSink::default());
        let task = ScriptedGenerationTask::new().fail_with("execution blew up");

        let err = task
            .generate(GenerateRequest::from_text("hi"), sink.clone())
            .await
            .unwrap_err();

        assert_eq!(err, GenerationError::Execution("execution blew up".to_string()));
        assert_eq!(sink.names().len(), 4);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_any_hook() {
        let sink = Arc::new(RecordingSink::default());
        let task = ScriptedGenerationTask::new();

        let err = task
            .generate(GenerateRequest::from_text("   "), sink.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::InvalidRequest(_)));
        assert!(sink.names().is_empty());
    }

    #[tokio::test]
    async fn context_round_trips_through_storage() {
        let storage = Arc::new(InMemoryObjectStorage::new());
        let task = ScriptedGenerationTask::new().with_storage(storage.clone());
        let sink = Arc::new(RecordingSink::default());

        let first = task
            .generate(GenerateRequest::from_text("one"), sink.clone())
            .await
            .unwrap();
        let first_id = first.context_file_id.unwrap();

        let mut request = GenerateRequest::from_text("two");
        request.context_file_id = Some(first_id);
        let second = task.generate(request, sink).await.unwrap();

        let bytes = storage.download(&second.context_file_id.unwrap()).await.unwrap();
        let context: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(context["turns"], 2);
    }

    #[tokio::test]
    async fn missing_context_file_is_a_storage_error() {
        let task = ScriptedGenerationTask::new()
            .with_storage(Arc::new(InMemoryObjectStorage::new()));
        let mut request = GenerateRequest::from_text("hi");
        request.context_file_id = Some("missing".to_string());

        let err = task
            .generate(request, Arc::new(RecordingSink::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, GenerationError::Storage(_)));
    }
}
