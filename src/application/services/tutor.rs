use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::application::services::prompt::{PromptContext, PromptTemplate};
use crate::application::services::rag::Retriever;
use crate::domain::{ports::LlmService, ConversationTurn, Memory, SessionState};

/// One conversation: retrieval, prompt assembly and completion over a
/// private memory. Callers must not run two `ask`s on the same session
/// concurrently; `SessionRegistry` serializes access.
pub struct TutorSession {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmService>,
    template: Arc<PromptTemplate>,
    memory: Memory,
    top_k: usize,
}

impl TutorSession {
    pub fn new(
        retriever: Arc<Retriever>,
        llm: Arc<dyn LlmService>,
        template: Arc<PromptTemplate>,
    ) -> Self {
        let top_k = retriever.default_top_k();
        Self {
            retriever,
            llm,
            template,
            memory: Memory::new(),
            top_k,
        }
    }

    /// Continues a conversation from persisted turns.
    pub fn resume(mut self, history: Vec<ConversationTurn>) -> Self {
        self.memory = Memory::from_turns(history);
        self
    }

    pub fn state(&self) -> SessionState {
        self.memory.state()
    }

    /// Time of the last answered question, if any.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.memory.updated_at()
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.memory.turns()
    }

    /// Answers `question`, or returns `None` when retrieval or the model
    /// call fails. Memory only changes on success.
    #[instrument(skip(self), fields(turns = self.memory.len()))]
    pub async fn ask(&mut self, question: &str) -> Option<String> {
        let context = match self.retriever.context(question, self.top_k).await {
            Ok(context) => context,
            Err(e) => {
                warn!(error = %e, query = question, "retrieval failed");
                return None;
            }
        };
        if context.is_empty() {
            info!(query = question, "no context retrieved, answering without textbook material");
        }

        let prompt = self.template.render(&PromptContext {
            context,
            history: self.memory.turns(),
            question,
        });

        match self.llm.complete(&prompt).await {
            Ok(answer) => {
                self.memory.record_exchange(question, answer.as_str());
                Some(answer)
            }
            Err(e) => {
                warn!(error = %e, query = question, "completion failed");
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.memory.clear();
    }
}
