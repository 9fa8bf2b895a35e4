//! Wiring from configuration to concrete adapters, shared by both binaries.

use std::sync::Arc;
use tracing::info;

use crate::application::PromptTemplate;
use crate::domain::{
    ports::{EmbeddingService, MessageStore},
    DomainError,
};
use crate::infrastructure::config::{
    EmbeddingConfig, EmbeddingProvider, StoreBackend, StoreConfig, TutorPrompts,
};
use crate::infrastructure::embedding::{HashingEmbedding, TextEmbedding};
use crate::infrastructure::message_store::{create_pool, InMemoryMessageStore, RedisMessageStore};

/// The embedding provider for both indexing and querying. The two must
/// agree, so they are always built from the same section.
pub fn embedding_service(config: &EmbeddingConfig) -> Arc<dyn EmbeddingService> {
    match config.provider {
        EmbeddingProvider::Openai => Arc::new(TextEmbedding::from_config(config)),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedding::new(config.dimension)),
    }
}

pub async fn message_store(config: &StoreConfig) -> Result<Arc<dyn MessageStore>, DomainError> {
    match config.backend {
        StoreBackend::Memory => {
            info!("using in-memory message store");
            Ok(Arc::new(InMemoryMessageStore::new()))
        }
        StoreBackend::Redis => {
            let pool = create_pool(&config.redis_url)?;
            let store = RedisMessageStore::new(pool);
            store.ping().await?;
            info!("connected to redis message store");
            Ok(Arc::new(store))
        }
    }
}

pub fn prompt_template(prompts: &TutorPrompts) -> PromptTemplate {
    PromptTemplate {
        persona: prompts.persona.clone(),
        creator: prompts.creator.clone(),
        rules: prompts.rules.clone(),
        no_context: prompts.no_context.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashing_provider_matches_config() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Hashing,
            dimension: 128,
            ..EmbeddingConfig::default()
        };
        let service = embedding_service(&config);
        assert_eq!(service.dimension(), 128);
        assert_eq!(service.model_id(), "hashing-v1-128");
    }

    #[tokio::test]
    async fn test_memory_store_backend() {
        let store = message_store(&StoreConfig::default()).await.unwrap();
        assert!(store.ping().await.is_ok());
        assert!(store.history("nobody", 10).await.unwrap().is_empty());
    }

    #[test]
    fn test_prompt_template_from_config() {
        let template = prompt_template(&TutorPrompts::default());
        assert_eq!(template.rules.len(), 5);
        assert!(template.system_instruction().contains("the AI Tutor project team"));
    }
}
