pub mod bootstrap;
pub mod config;
pub mod embedding;
pub mod llm;
pub mod message_store;
pub mod safety;
pub mod vector_store;

pub use bootstrap::{embedding_service, message_store, prompt_template};
pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::{HashingEmbedding, TextEmbedding};
pub use llm::RigLlm;
pub use message_store::{InMemoryMessageStore, RedisMessageStore};
pub use safety::{KeywordFilter, BLOCKED_REASON, OUT_OF_SCOPE_REASON};
pub use vector_store::{read_manifest, FlatIndex};
