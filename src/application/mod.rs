//! Application layer - Use cases and orchestration.
//!
//! Services here depend on domain ports (traits) rather than concrete
//! adapters. The offline indexing pipeline is the one exception: it builds
//! the concrete `FlatIndex` it persists.

pub mod services;

pub use services::{
    ChatReply, ChatService, CorpusIngestor, ExportFormat, IndexReport, IndexingService,
    PromptContext, PromptTemplate, Retriever, SessionRegistry, TutorSession,
};
