use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Small descriptor persisted next to an index and read before anything else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub metric: DistanceMetric,
    pub created_at: DateTime<Utc>,
}

impl IndexManifest {
    pub fn new(embedding_model: impl Into<String>, dimension: usize, chunk_count: usize) -> Self {
        Self {
            format_version: INDEX_FORMAT_VERSION,
            embedding_model: embedding_model.into(),
            dimension,
            chunk_count,
            metric: DistanceMetric::L2,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    L2,
}
