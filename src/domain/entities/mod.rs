mod chunk;
mod conversation;
mod embedding;
mod index;
mod safety;
mod user;

pub use chunk::{split_text, Chunk, Locator, SearchResult};
pub use conversation::{ConversationTurn, Memory, Role, SessionState};
pub use embedding::{l2_distance, Embedding};
pub use index::{DistanceMetric, IndexManifest, INDEX_FORMAT_VERSION};
pub use safety::SafetyVerdict;
pub use user::{StoredTurn, UserStats};
