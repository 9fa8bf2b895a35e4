use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::application::services::ingest::CorpusIngestor;
use crate::domain::{ports::EmbeddingService, Chunk, DomainError, Embedding};
use crate::infrastructure::FlatIndex;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    pub chunks: usize,
    pub sources: usize,
    pub dimension: usize,
}

/// Offline pipeline: ingest, embed in batches, build, persist.
pub struct IndexingService {
    ingestor: CorpusIngestor,
    embedding: Arc<dyn EmbeddingService>,
    batch_size: usize,
}

impl IndexingService {
    pub fn new(
        ingestor: CorpusIngestor,
        embedding: Arc<dyn EmbeddingService>,
        batch_size: usize,
    ) -> Self {
        Self {
            ingestor,
            embedding,
            batch_size: batch_size.max(1),
        }
    }

    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn embed_chunks(
        &self,
        chunks: Vec<Chunk>,
    ) -> Result<Vec<(Chunk, Embedding)>, DomainError> {
        let mut embedded = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedding.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(DomainError::external(format!(
                    "embedding provider returned {} vectors for {} texts",
                    embeddings.len(),
                    batch.len()
                )));
            }
            embedded.extend(batch.iter().cloned().zip(embeddings));
            info!(done = embedded.len(), total = chunks.len(), "embedded batch");
        }
        Ok(embedded)
    }

    /// Builds an index over every document in `corpus_dir`. An empty corpus
    /// is an `EmptyCorpus` error rather than an empty index.
    #[instrument(skip(self, corpus_dir), fields(corpus = %corpus_dir.display()))]
    pub async fn build(&self, corpus_dir: &Path) -> Result<FlatIndex, DomainError> {
        let chunks = self.ingestor.ingest_dir(corpus_dir);
        if chunks.is_empty() {
            return Err(DomainError::empty_corpus(format!(
                "no chunks ingested from {}",
                corpus_dir.display()
            )));
        }
        let embedded = self.embed_chunks(chunks).await?;
        FlatIndex::build(self.embedding.model_id(), embedded)
    }

    /// Builds and saves. The previous index at `index_path` stays readable
    /// until the new one is complete.
    pub async fn rebuild(
        &self,
        corpus_dir: &Path,
        index_path: &Path,
    ) -> Result<IndexReport, DomainError> {
        let index = self.build(corpus_dir).await?;
        index.save(index_path)?;

        let mut sources: Vec<&str> = index.chunks().iter().map(|c| c.source.as_str()).collect();
        sources.sort_unstable();
        sources.dedup();

        Ok(IndexReport {
            chunks: index.chunks().len(),
            sources: sources.len(),
            dimension: index.dimension(),
        })
    }
}
