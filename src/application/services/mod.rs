mod chat;
mod export;
mod indexing;
mod ingest;
mod prompt;
mod rag;
mod session;
#[cfg(test)]
pub(crate) mod test_support;
mod tutor;

pub use chat::{ChatReply, ChatService};
pub use export::{render_transcript, ExportFormat, EXPORT_LIMIT};
pub use indexing::{IndexReport, IndexingService};
pub use ingest::{CorpusIngestor, PAGE_BREAK};
pub use prompt::{PromptContext, PromptTemplate};
pub use rag::{format_context, Retriever, CONTEXT_DELIMITER};
pub use session::{SessionRegistry, SharedSession};
pub use tutor::TutorSession;
