use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::{anthropic, gemini, groq, openai};
use std::time::Duration;

use crate::domain::{ports::LlmService, DomainError};
use crate::infrastructure::config::{LlmConfig, LlmProvider};

impl LlmProvider {
    /// Environment variable holding the provider credential.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::Groq => "GROQ_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Openai => "OPENAI_API_KEY",
        }
    }
}

/// Stateless hosted completion through `rig`.
pub struct RigLlm {
    provider: LlmProvider,
    model: String,
    temperature: f64,
    max_tokens: u64,
    timeout: Duration,
}

macro_rules! prompt_agent {
    ($client:expr, $llm:expr, $prompt:expr) => {{
        let agent = $client
            .agent(&$llm.model)
            .temperature($llm.temperature)
            .max_tokens($llm.max_tokens)
            .build();
        agent
            .prompt($prompt)
            .await
            .map_err(|e| DomainError::external(format!("Completion failed: {e}")))
    }};
}

impl RigLlm {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            provider: config.provider,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn dispatch(&self, prompt: &str) -> Result<String, DomainError> {
        match self.provider {
            LlmProvider::Groq => prompt_agent!(groq::Client::from_env(), self, prompt),
            LlmProvider::Anthropic => prompt_agent!(anthropic::Client::from_env(), self, prompt),
            LlmProvider::Gemini => prompt_agent!(gemini::Client::from_env(), self, prompt),
            LlmProvider::Openai => prompt_agent!(openai::Client::from_env(), self, prompt),
        }
    }
}

#[async_trait]
impl LlmService for RigLlm {
    async fn complete(&self, prompt: &str) -> Result<String, DomainError> {
        // rig's from_env clients panic on a missing key; surface it as a provider failure
        let key_var = self.provider.api_key_env();
        if std::env::var(key_var).map(|k| k.is_empty()).unwrap_or(true) {
            return Err(DomainError::external(format!("{key_var} is not set")));
        }

        tokio::time::timeout(self.timeout, self.dispatch(prompt))
            .await
            .map_err(|_| DomainError::timeout("Completion timed out"))?
    }
}
