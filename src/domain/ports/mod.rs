mod content_filter;
mod embedding;
mod llm;
mod message_store;
mod vector_store;

pub use content_filter::ContentFilter;
pub use embedding::EmbeddingService;
pub use llm::LlmService;
pub use message_store::MessageStore;
pub use vector_store::VectorStore;
