use crate::domain::{errors::DomainError, Embedding};
use async_trait::async_trait;

/// Maps text to fixed-length vectors. The same configuration must be used to
/// build an index and to query it.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError>;
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError>;
    fn dimension(&self) -> usize;
    fn model_id(&self) -> &str;
}
