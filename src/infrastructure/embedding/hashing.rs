use async_trait::async_trait;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::domain::{ports::EmbeddingService, DomainError, Embedding};

const SEED: u64 = 0x5eed;

/// Deterministic, offline embedding: a signed feature-hashing bag of
/// lower-cased word tokens, normalized to unit length.
///
/// Texts that share vocabulary land close together under L2, which is enough
/// for small curricula, local development and tests.
pub struct HashingEmbedding {
    dimension: usize,
    model_id: String,
}

impl HashingEmbedding {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            model_id: format!("hashing-v1-{dimension}"),
        }
    }

    pub fn embed_text(&self, text: &str) -> Embedding {
        let mut vec = vec![0.0f32; self.dimension];
        for token in tokens(text) {
            let mut hasher = XxHash64::with_seed(SEED);
            hasher.write(token.as_bytes());
            let hash = hasher.finish();
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vec[bucket] += sign;
        }
        Embedding::new(vec).normalized()
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingService for HashingEmbedding {
    async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
        Ok(self.embed_text(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
