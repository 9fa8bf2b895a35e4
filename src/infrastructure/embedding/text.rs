use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;
use std::collections::HashMap;
use std::time::Duration;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Hosted OpenAI embeddings. Reads `OPENAI_API_KEY` from the environment.
pub struct TextEmbedding {
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl TextEmbedding {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            model: config.model.clone(),
            dimension: config.dimension,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    fn checked(&self, vec: Vec<f64>) -> Result<Embedding, DomainError> {
        if vec.len() != self.dimension {
            return Err(DomainError::config_mismatch(format!(
                "model '{}' returned {} dimensions, configured for {}",
                self.model,
                vec.len(),
                self.dimension
            )));
        }
        Ok(Embedding::new(vec.into_iter().map(|x| x as f32).collect()))
    }
}

#[async_trait]
impl EmbeddingService for TextEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        self.embed_batch(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::internal("No embedding returned"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        if std::env::var(OPENAI_KEY_ENV).is_err() {
            return Err(DomainError::external(format!("{OPENAI_KEY_ENV} is not set")));
        }
        let client = openai::Client::from_env();
        let model = client.embedding_model(&self.model);

        let mut builder = EmbeddingsBuilder::new(model);
        for text in texts {
            builder = builder
                .document(*text)
                .map_err(|e| DomainError::external(e.to_string()))?;
        }

        let embeddings = tokio::time::timeout(self.timeout, builder.build())
            .await
            .map_err(|_| DomainError::timeout("Embedding request timed out"))?
            .map_err(|e| DomainError::external(e.to_string()))?;

        // Keyed by text so the result follows the input order.
        let mut by_text: HashMap<&str, Vec<f64>> = HashMap::with_capacity(embeddings.len());
        for (doc, emb) in embeddings {
            by_text.insert(doc, emb.first().vec);
        }
        texts
            .iter()
            .map(|text| {
                let vec = by_text
                    .get(text)
                    .cloned()
                    .ok_or_else(|| DomainError::internal("No embedding returned"))?;
                self.checked(vec)
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}
