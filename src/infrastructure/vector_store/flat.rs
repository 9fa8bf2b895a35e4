use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

use crate::domain::{
    ports::VectorStore, Chunk, DomainError, Embedding, IndexManifest, SearchResult,
    INDEX_FORMAT_VERSION,
};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHUNKS_FILE: &str = "chunks.json";
pub const VECTORS_FILE: &str = "vectors.bin";

const F32_BYTES: usize = std::mem::size_of::<f32>();

/// Exact L2 index over a small corpus, kept entirely in memory.
///
/// Vectors live in one row-major buffer parallel to `chunks`. Search is a
/// full scan; ties on distance are broken by insertion order, which makes the
/// ranking a total order and results reproducible after a save/load cycle.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    manifest: IndexManifest,
    chunks: Vec<Chunk>,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn build(
        embedding_model: &str,
        entries: Vec<(Chunk, Embedding)>,
    ) -> Result<Self, DomainError> {
        let dimension = match entries.first() {
            Some((_, embedding)) => embedding.dimension(),
            None => {
                return Err(DomainError::empty_corpus(
                    "cannot build an index from zero chunks",
                ))
            }
        };
        if dimension == 0 {
            return Err(DomainError::validation("embeddings must not be empty"));
        }

        let mut chunks = Vec::with_capacity(entries.len());
        let mut vectors = Vec::with_capacity(entries.len() * dimension);
        for (chunk, embedding) in entries {
            if embedding.dimension() != dimension {
                return Err(DomainError::config_mismatch(format!(
                    "chunk {} has dimension {}, expected {}",
                    chunk.id,
                    embedding.dimension(),
                    dimension
                )));
            }
            vectors.extend_from_slice(embedding.as_slice());
            chunks.push(chunk);
        }

        let manifest = IndexManifest::new(embedding_model, dimension, chunks.len());
        info!(chunks = chunks.len(), dimension, model = embedding_model, "index built");

        Ok(Self {
            manifest,
            chunks,
            vectors,
        })
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn dimension(&self) -> usize {
        self.manifest.dimension
    }

    fn vector(&self, row: usize) -> &[f32] {
        let dim = self.manifest.dimension;
        &self.vectors[row * dim..(row + 1) * dim]
    }

    /// Writes the index to `path`, replacing any previous index there only
    /// once every file has been written.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), DomainError> {
        let staging = sibling(path, "partial")?;
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let manifest = serde_json::to_vec_pretty(&self.manifest)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        fs::write(staging.join(MANIFEST_FILE), manifest)?;

        let chunks = serde_json::to_vec(&self.chunks)
            .map_err(|e| DomainError::internal(e.to_string()))?;
        fs::write(staging.join(CHUNKS_FILE), chunks)?;

        let mut bytes = Vec::with_capacity(self.vectors.len() * F32_BYTES);
        for value in &self.vectors {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        fs::write(staging.join(VECTORS_FILE), bytes)?;

        swap_into_place(&staging, path)?;

        info!(chunks = self.chunks.len(), "index saved");
        Ok(())
    }

    /// Loads an index and checks it against the active embedding provider.
    #[instrument(skip(path), fields(path = %path.display()))]
    pub fn load(path: &Path, embedding_model: &str, dimension: usize) -> Result<Self, DomainError> {
        let manifest = read_manifest(path)?;

        if manifest.dimension != dimension {
            return Err(DomainError::config_mismatch(format!(
                "index at {} holds {}-dimensional vectors but the embedding provider produces {}",
                path.display(),
                manifest.dimension,
                dimension
            )));
        }
        if manifest.embedding_model != embedding_model {
            return Err(DomainError::config_mismatch(format!(
                "index at {} was built with '{}' but the active embedding model is '{}'",
                path.display(),
                manifest.embedding_model,
                embedding_model
            )));
        }

        let corrupt = |reason: String| DomainError::corrupt_index(path.display().to_string(), reason);

        let raw_chunks = read_file(path, CHUNKS_FILE)?;
        let chunks: Vec<Chunk> = serde_json::from_slice(&raw_chunks)
            .map_err(|e| corrupt(format!("{CHUNKS_FILE}: {e}")))?;
        if chunks.is_empty() || chunks.len() != manifest.chunk_count {
            return Err(corrupt(format!(
                "{CHUNKS_FILE} holds {} chunks, manifest records {}",
                chunks.len(),
                manifest.chunk_count
            )));
        }

        let raw_vectors = read_file(path, VECTORS_FILE)?;
        let expected = manifest.chunk_count * manifest.dimension * F32_BYTES;
        if raw_vectors.len() != expected {
            return Err(corrupt(format!(
                "{VECTORS_FILE} is {} bytes, expected {expected}",
                raw_vectors.len()
            )));
        }
        let vectors = raw_vectors
            .chunks_exact(F32_BYTES)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        debug!(chunks = chunks.len(), "index loaded");
        Ok(Self {
            manifest,
            chunks,
            vectors,
        })
    }
}

impl VectorStore for FlatIndex {
    fn search(&self, query: &Embedding, top_k: usize) -> Result<Vec<SearchResult>, DomainError> {
        if query.dimension() != self.manifest.dimension {
            return Err(DomainError::config_mismatch(format!(
                "query has dimension {}, index expects {}",
                query.dimension(),
                self.manifest.dimension
            )));
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut ranked: Vec<(f32, usize)> = (0..self.chunks.len())
            .map(|row| (query.l2_distance(self.vector(row)), row))
            .collect();

        let by_rank = |a: &(f32, usize), b: &(f32, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        if top_k < ranked.len() {
            ranked.select_nth_unstable_by(top_k - 1, by_rank);
            ranked.truncate(top_k);
        }
        ranked.sort_by(by_rank);

        Ok(ranked
            .into_iter()
            .map(|(distance, row)| SearchResult {
                chunk: self.chunks[row].clone(),
                distance,
            })
            .collect())
    }

    fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Reads and sanity-checks the manifest of the index at `path`.
pub fn read_manifest(path: &Path) -> Result<IndexManifest, DomainError> {
    let raw = read_file(path, MANIFEST_FILE)?;
    let manifest: IndexManifest = serde_json::from_slice(&raw).map_err(|e| {
        DomainError::corrupt_index(path.display().to_string(), format!("{MANIFEST_FILE}: {e}"))
    })?;
    if manifest.format_version != INDEX_FORMAT_VERSION {
        return Err(DomainError::corrupt_index(
            path.display().to_string(),
            format!("unsupported format version {}", manifest.format_version),
        ));
    }
    Ok(manifest)
}

fn read_file(dir: &Path, name: &str) -> Result<Vec<u8>, DomainError> {
    fs::read(dir.join(name)).map_err(|e| {
        let reason = match e.kind() {
            ErrorKind::NotFound => format!("{name} is missing"),
            _ => format!("{name}: {e}"),
        };
        DomainError::corrupt_index(dir.display().to_string(), reason)
    })
}

/// Moves `staging` to `path`. An existing index is parked at `<name>.old`
/// and moved back if the second rename fails.
fn swap_into_place(staging: &Path, path: &Path) -> Result<(), DomainError> {
    if !path.exists() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::rename(staging, path)?;
        return Ok(());
    }

    let previous = sibling(path, "old")?;
    if previous.exists() {
        fs::remove_dir_all(&previous)?;
    }
    fs::rename(path, &previous)?;
    if let Err(e) = fs::rename(staging, path) {
        if let Err(restore) = fs::rename(&previous, path) {
            error!(
                error = %restore,
                previous = %previous.display(),
                "failed to restore previous index"
            );
        }
        return Err(e.into());
    }
    fs::remove_dir_all(&previous)?;
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> Result<PathBuf, DomainError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DomainError::validation(format!("invalid index path {}", path.display())))?;
    Ok(path.with_file_name(format!("{name}.{suffix}")))
}
