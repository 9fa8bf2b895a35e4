use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Failed to ingest {source_name}: {reason}")]
    Ingestion { source_name: String, reason: String },

    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    #[error("Configuration mismatch: {0}")]
    ConfigMismatch(String),

    #[error("Corrupt index at {path}: {reason}")]
    CorruptIndex { path: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn external(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn ingestion(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Ingestion {
            source_name: source.into(),
            reason: reason.into(),
        }
    }

    pub fn empty_corpus(msg: impl Into<String>) -> Self {
        Self::EmptyCorpus(msg.into())
    }

    pub fn config_mismatch(msg: impl Into<String>) -> Self {
        Self::ConfigMismatch(msg.into())
    }

    pub fn corrupt_index(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptIndex {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
