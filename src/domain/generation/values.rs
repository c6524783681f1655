//! Request and response values for a generation run.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::GenerationError;

/// LLM vendor backing a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAi,
    Google,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Google => "google",
        }
    }
}

/// Which model to prompt and how.
///
/// `api_key` is optional on the wire; the server's configured key for the
/// provider is used when it is absent.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default)]
    pub api_key: Option<SecretString>,
    pub model: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Agent loop limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat2EditConfig {
    #[serde(default = "default_max_prompt_cycles")]
    pub max_prompt_cycles: u32,
    #[serde(default = "default_max_llm_exchanges")]
    pub max_llm_exchanges: u32,
}

impl Default for Chat2EditConfig {
    fn default() -> Self {
        Self {
            max_prompt_cycles: default_max_prompt_cycles(),
            max_llm_exchanges: default_max_llm_exchanges(),
        }
    }
}

fn default_max_prompt_cycles() -> u32 {
    5
}

fn default_max_llm_exchanges() -> u32 {
    2
}

/// Reference to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentModel {
    pub file_id: String,
}

/// A chat message with optional file attachments.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageModel {
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentModel>,
}

/// Input of a generation run.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub llm_config: Option<LlmConfig>,
    #[serde(default)]
    pub chat2edit_config: Chat2EditConfig,
    pub message: MessageModel,
    /// Prior chat cycles, passed through to the agent untouched.
    #[serde(default)]
    pub history: Vec<Value>,
    #[serde(default)]
    pub context_file_id: Option<String>,
}

impl GenerateRequest {
    /// Creates a request for a plain text message with default limits.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            llm_config: None,
            chat2edit_config: Chat2EditConfig::default(),
            message: MessageModel {
                text: text.into(),
                attachments: Vec::new(),
            },
            history: Vec::new(),
            context_file_id: None,
        }
    }

    /// Checks the request before a run is started.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.message.text.trim().is_empty() && self.message.attachments.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "message must contain text or attachments".to_string(),
            ));
        }
        if self.chat2edit_config.max_prompt_cycles == 0 {
            return Err(GenerationError::InvalidRequest(
                "max_prompt_cycles must be at least 1".to_string(),
            ));
        }
        if self.chat2edit_config.max_llm_exchanges == 0 {
            return Err(GenerationError::InvalidRequest(
                "max_llm_exchanges must be at least 1".to_string(),
            ));
        }
        if let Some(llm) = &self.llm_config {
            if llm.model.trim().is_empty() {
                return Err(GenerationError::InvalidRequest(
                    "llm_config.model cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Payload of the `request` progress event. Never includes secrets.
    pub fn summary(&self) -> Value {
        let llm = self.llm_config.as_ref().map(|llm| {
            json!({
                "provider": llm.provider.as_str(),
                "model": llm.model,
            })
        });

        json!({
            "text": self.message.text,
            "attachments": self
                .message
                .attachments
                .iter()
                .map(|a| a.file_id.clone())
                .collect::<Vec<_>>(),
            "history_length": self.history.len(),
            "context_file_id": self.context_file_id,
            "llm": llm,
        })
    }
}

/// Output of a successful generation run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub message: MessageModel,
    #[serde(default)]
    pub cycle: Option<Value>,
    #[serde(default)]
    pub context_file_id: Option<String>,
}
