use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::{
    ports::{EmbeddingService, VectorStore},
    Chunk, DomainError, SearchResult,
};

pub const CONTEXT_DELIMITER: &str = "\n---\n";

/// Query-time wrapper around a read-only index.
pub struct Retriever {
    embedding: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorStore>,
    default_top_k: usize,
}

impl Retriever {
    /// Fails with `ConfigMismatch` unless `embedding` is the provider the
    /// index was built with.
    pub fn new(
        embedding: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorStore>,
        default_top_k: usize,
    ) -> Result<Self, DomainError> {
        let manifest = index.manifest();
        if manifest.embedding_model != embedding.model_id() {
            return Err(DomainError::config_mismatch(format!(
                "index built with '{}', active embedding model is '{}'",
                manifest.embedding_model,
                embedding.model_id()
            )));
        }
        if manifest.dimension != embedding.dimension() {
            return Err(DomainError::config_mismatch(format!(
                "index dimension {} differs from embedding dimension {}",
                manifest.dimension,
                embedding.dimension()
            )));
        }

        Ok(Self {
            embedding,
            index,
            default_top_k,
        })
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub fn index(&self) -> &Arc<dyn VectorStore> {
        &self.index
    }

    #[instrument(skip(self), fields(index_size = self.index.len()))]
    pub async fn retrieve_with_scores(
        &self,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let embedding = self.embedding.embed(query).await?;
        let results = self.index.search(&embedding, top_k)?;
        if results.is_empty() {
            debug!("retrieval returned no chunks");
        }
        Ok(results)
    }

    /// Nearest chunks for `query`. The subject filter runs after the
    /// nearest-neighbour search, so it can return fewer than `top_k` chunks,
    /// or none, when the closest chunks come from other subjects.
    #[instrument(skip(self))]
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        subject: Option<&str>,
    ) -> Result<Vec<Chunk>, DomainError> {
        let results = self.retrieve_with_scores(query, top_k).await?;
        Ok(results
            .into_iter()
            .map(|r| r.chunk)
            .filter(|chunk| subject.map_or(true, |s| chunk.matches_subject(s)))
            .collect())
    }

    /// Ranked chunks rendered as one block for a prompt. Empty when nothing
    /// was retrieved.
    pub async fn context(&self, query: &str, top_k: usize) -> Result<String, DomainError> {
        let chunks = self.retrieve(query, top_k, None).await?;
        Ok(format_context(&chunks))
    }
}

pub fn format_context(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|chunk| {
            format!(
                "Source: {}, Page: {}\nContent: {}\n",
                chunk.source_name(),
                chunk.locator,
                chunk.text
            )
        })
        .collect::<Vec<_>>()
        .join(CONTEXT_DELIMITER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Embedding, Locator};
    use crate::infrastructure::{FlatIndex, HashingEmbedding};

    const DIM: usize = 1024;

    async fn index_of(embedder: &HashingEmbedding, docs: &[(&str, &str)]) -> FlatIndex {
        let mut entries = Vec::new();
        for (source, text) in docs {
            let embedding = embedder.embed(text).await.unwrap();
            entries.push((Chunk::new(*text, *source, Locator::Page(1)), embedding));
        }
        FlatIndex::build(embedder.model_id(), entries).unwrap()
    }

    async fn retriever(docs: &[(&str, &str)]) -> Retriever {
        let embedder = HashingEmbedding::new(DIM);
        let index = index_of(&embedder, docs).await;
        Retriever::new(Arc::new(embedder), Arc::new(index), 3).unwrap()
    }

    fn curriculum() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                "physics_ch10.pdf",
                "What is the quadratic formula? Physics uses the quadratic formula for projectile motion.",
            ),
            (
                "maths_ch4.pdf",
                "The quadratic formula gives the roots of a quadratic equation.",
            ),
            (
                "chemistry_ch1.pdf",
                "Chemical reactions rearrange atoms and conserve mass.",
            ),
        ]
    }

    #[tokio::test]
    async fn test_new_rejects_different_model() {
        let embedder = HashingEmbedding::new(DIM);
        let index = index_of(&embedder, &curriculum()).await;

        struct Renamed(HashingEmbedding);
        #[async_trait::async_trait]
        impl EmbeddingService for Renamed {
            async fn embed(&self, text: &str) -> Result<Embedding, DomainError> {
                self.0.embed(text).await
            }
            async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, DomainError> {
                self.0.embed_batch(texts).await
            }
            fn dimension(&self) -> usize {
                self.0.dimension()
            }
            fn model_id(&self) -> &str {
                "another-model"
            }
        }

        let result = Retriever::new(Arc::new(Renamed(embedder)), Arc::new(index), 3);
        assert!(matches!(result, Err(DomainError::ConfigMismatch(_))));
    }

    #[tokio::test]
    async fn test_new_rejects_different_dimension() {
        let index = index_of(&HashingEmbedding::new(DIM), &curriculum()).await;
        let result = Retriever::new(Arc::new(HashingEmbedding::new(64)), Arc::new(index), 3);
        assert!(matches!(result, Err(DomainError::ConfigMismatch(_))));
    }

    #[tokio::test]
    async fn test_retrieve_is_ranked_and_deterministic() {
        let retriever = retriever(&curriculum()).await;

        let first = retriever
            .retrieve_with_scores("What is the quadratic formula?", 3)
            .await
            .unwrap();
        let second = retriever
            .retrieve_with_scores("What is the quadratic formula?", 3)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        for pair in first.windows(2) {
            assert!(pair[0].distance <= pair[1].distance);
        }
        assert_eq!(first[0].chunk.source, "physics_ch10.pdf");
    }

    #[tokio::test]
    async fn test_subject_filter_applies_after_search() {
        let retriever = retriever(&curriculum()).await;
        let query = "What is the quadratic formula?";

        let nearest = retriever.retrieve(query, 3, None).await.unwrap();
        assert_eq!(nearest[0].source, "physics_ch10.pdf");

        let maths = retriever.retrieve(query, 3, Some("MATHS")).await.unwrap();
        assert_eq!(maths.len(), 1);
        assert!(maths.iter().all(|c| c.source.to_lowercase().contains("maths")));
    }

    #[tokio::test]
    async fn test_subject_filter_may_return_nothing() {
        let retriever = retriever(&curriculum()).await;

        let chunks = retriever
            .retrieve("What is the quadratic formula?", 1, Some("maths"))
            .await
            .unwrap();

        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_context_format() {
        let retriever = retriever(&curriculum()).await;
        let context = retriever
            .context("conserve mass in chemical reactions", 2)
            .await
            .unwrap();

        let blocks: Vec<_> = context.split(CONTEXT_DELIMITER).collect();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("Source: chemistry_ch1.pdf, Page: 1\nContent: Chemical"));
    }

    #[test]
    fn test_format_context_uses_file_name_and_is_empty_for_no_chunks() {
        assert_eq!(format_context(&[]), "");

        let chunk = Chunk::new("Mirrors.", "books/physics/light.txt", Locator::Page(7));
        assert_eq!(
            format_context(&[chunk]),
            "Source: light.txt, Page: 7\nContent: Mirrors.\n"
        );
    }
}
