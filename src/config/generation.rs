//! Generation defaults configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::generation::{GenerateRequest, LlmConfig, LlmProvider};

use super::error::ValidationError;

/// Defaults applied to generation requests that leave them out.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Provider used when a request carries no `llm_config`
    #[serde(default)]
    pub provider: LlmProvider,

    /// Model used when a request carries no `llm_config`
    #[serde(default = "default_model")]
    pub model: String,

    /// Server-side OpenAI key
    pub openai_api_key: Option<SecretString>,

    /// Server-side Google key
    pub google_api_key: Option<SecretString>,

    /// Upper bound on a request's `max_prompt_cycles`
    #[serde(default = "default_max_prompt_cycles")]
    pub max_prompt_cycles: u32,

    /// Upper bound on a request's `max_llm_exchanges`
    #[serde(default = "default_max_llm_exchanges")]
    pub max_llm_exchanges: u32,
}

impl GenerationConfig {
    /// Server key for `provider`, if one is configured.
    pub fn api_key(&self, provider: LlmProvider) -> Option<&SecretString> {
        let key = match provider {
            LlmProvider::OpenAi => self.openai_api_key.as_ref(),
            LlmProvider::Google => self.google_api_key.as_ref(),
        };
        key.filter(|k| !k.expose_secret().is_empty())
    }

    /// Fill in the default LLM, the server key and the agent limit caps.
    pub fn apply_defaults(&self, mut request: GenerateRequest) -> GenerateRequest {
        let llm = request.llm_config.get_or_insert_with(|| LlmConfig {
            provider: self.provider,
            api_key: None,
            model: self.model.clone(),
            params: Default::default(),
        });
        if llm.api_key.is_none() {
            llm.api_key = self.api_key(llm.provider).cloned();
        }

        let limits = &mut request.chat2edit_config;
        limits.max_prompt_cycles = limits.max_prompt_cycles.min(self.max_prompt_cycles);
        limits.max_llm_exchanges = limits.max_llm_exchanges.min(self.max_llm_exchanges);

        request
    }

    /// Validate generation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::MissingRequired("GENERATION__MODEL"));
        }
        if self.max_prompt_cycles == 0 || self.max_llm_exchanges == 0 {
            return Err(ValidationError::InvalidAgentLimits);
        }
        Ok(())
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::default(),
            model: default_model(),
            openai_api_key: None,
            google_api_key: None,
            max_prompt_cycles: default_max_prompt_cycles(),
            max_llm_exchanges: default_max_llm_exchanges(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_prompt_cycles() -> u32 {
    5
}

fn default_max_llm_exchanges() -> u32 {
    2
}
