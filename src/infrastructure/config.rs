use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::domain::DomainError;

pub const CONFIG_PATH_ENV: &str = "AI_TUTOR_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub ingest: IngestConfig,
    pub index: IndexConfig,
    pub rag: RagConfig,
    pub store: StoreConfig,
    pub cors: CorsConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,
    Anthropic,
    Gemini,
    Openai,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u64,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    Openai,
    Hashing,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub timeout_seconds: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Openai,
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
            batch_size: 64,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub corpus_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("data/raw_content"),
            chunk_size: 700,
            chunk_overlap: 100,
            extensions: vec!["txt".to_string(), "md".to_string(), "pdf".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/vector_store"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
    pub history_limit: usize,
    /// Live tutor sessions held in memory before the idlest is evicted.
    pub max_sessions: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://localhost:6379".to_string(),
            history_limit: 50,
            max_sessions: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub tutor: TutorPrompts,
    pub messages: MessagesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TutorPrompts {
    pub persona: String,
    pub creator: String,
    pub rules: Vec<String>,
    pub no_context: String,
}

impl Default for TutorPrompts {
    fn default() -> Self {
        Self {
            persona: "You are an AI Tutor for Grade 10 students studying Maths, Physics, and Chemistry."
                .to_string(),
            creator: "the AI Tutor project team".to_string(),
            rules: vec![
                "Explain concepts clearly and step-by-step".to_string(),
                "Use simple language appropriate for 10th graders".to_string(),
                "Provide examples when helpful".to_string(),
                "Encourage students to think critically".to_string(),
                "If you don't know something, admit it honestly".to_string(),
            ],
            no_context: "No matching textbook material was found for this question.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub unavailable: String,
    pub disclaimer: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            unavailable: "Error processing your question. Please try again.".to_string(),
            disclaimer: "*Disclaimer: The solution provided is for educational purposes only. \
                         Please ensure you understand the steps involved.*"
                .to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `$AI_TUTOR_CONFIG` (or `config.yaml`), falling back to defaults
    /// when the file does not exist, then applies environment overrides.
    pub fn load() -> Result<Self, DomainError> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        let path = Path::new(&path);

        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, DomainError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, DomainError> {
        serde_yaml::from_str(raw)
            .map_err(|e| DomainError::validation(format!("invalid config: {e}")))
    }

    fn apply_env_overrides(&mut self) {
        let cfg = &mut self.config;
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse().ok()) {
            cfg.server.port = port;
        }
        if let Ok(path) = std::env::var("INDEX_PATH") {
            cfg.index.path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var("CORPUS_DIR") {
            cfg.ingest.corpus_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            cfg.store.redis_url = url;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            cfg.llm.model = model;
        }
        if let Ok(key) = std::env::var("API_KEY") {
            cfg.auth.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        let cfg = &self.config;
        if cfg.ingest.chunk_size == 0 {
            return Err(DomainError::validation("ingest.chunk_size must be positive"));
        }
        if cfg.ingest.chunk_overlap >= cfg.ingest.chunk_size {
            return Err(DomainError::validation(
                "ingest.chunk_overlap must be smaller than ingest.chunk_size",
            ));
        }
        if cfg.store.max_sessions == 0 {
            return Err(DomainError::validation("store.max_sessions must be positive"));
        }
        if cfg.rag.top_k == 0 {
            return Err(DomainError::validation("rag.top_k must be positive"));
        }
        if cfg.embedding.dimension == 0 || cfg.embedding.batch_size == 0 {
            return Err(DomainError::validation(
                "embedding.dimension and embedding.batch_size must be positive",
            ));
        }
        if !(0.0..=2.0).contains(&cfg.llm.temperature) {
            return Err(DomainError::validation("llm.temperature must be within [0, 2]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.config.ingest.chunk_size, 700);
        assert_eq!(config.config.ingest.chunk_overlap, 100);
        assert_eq!(config.config.rag.top_k, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            r#"
config:
  llm:
    provider: anthropic
    model: claude-3-5-haiku-latest
  embedding:
    provider: hashing
    dimension: 256
prompts:
  tutor:
    creator: Physics Department
"#,
        )
        .unwrap();

        assert_eq!(config.config.llm.provider, LlmProvider::Anthropic);
        assert_eq!(config.config.llm.temperature, 0.7);
        assert_eq!(config.config.embedding.provider, EmbeddingProvider::Hashing);
        assert_eq!(config.config.embedding.dimension, 256);
        assert_eq!(config.config.store.backend, StoreBackend::Memory);
        assert_eq!(config.prompts.tutor.creator, "Physics Department");
        assert_eq!(config.prompts.tutor.rules.len(), 5);
    }

    #[test]
    fn test_validate_rejects_overlap_not_smaller_than_size() {
        let mut config = AppConfig::default();
        config.config.ingest.chunk_overlap = 700;
        assert!(matches!(config.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_zero_max_sessions() {
        let mut config = AppConfig::default();
        config.config.store.max_sessions = 0;
        assert!(matches!(config.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = AppConfig::default();
        config.config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml_is_validation_error() {
        let err = AppConfig::from_yaml("config: [unterminated").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
