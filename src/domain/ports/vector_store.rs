use crate::domain::{errors::DomainError, Embedding, IndexManifest, SearchResult};

/// Read-only nearest-neighbour search. Implementations are immutable once
/// built, so a single instance may serve many sessions without locking.
pub trait VectorStore: Send + Sync {
    /// Up to `top_k` results ordered by ascending distance.
    fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError>;
    fn manifest(&self) -> &IndexManifest;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
