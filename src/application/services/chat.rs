use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::application::services::export::{render_transcript, ExportFormat, EXPORT_LIMIT};
use crate::application::services::session::{SessionRegistry, SharedSession};
use crate::domain::{
    ports::{ContentFilter, MessageStore},
    ConversationTurn, DomainError, Role, StoredTurn, UserStats,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatReply {
    /// Rejected by the content filter; nothing was stored.
    Blocked { reason: String },
    Answered { answer: String },
    /// The tutor could not answer; nothing was stored.
    Unavailable { message: String },
}

/// Entry point for one user's turn: safety gate, tutor session, transcript.
pub struct ChatService {
    sessions: SessionRegistry,
    store: Arc<dyn MessageStore>,
    filter: Arc<dyn ContentFilter>,
    history_limit: usize,
    unavailable_message: String,
}

impl ChatService {
    pub fn new(
        sessions: SessionRegistry,
        store: Arc<dyn MessageStore>,
        filter: Arc<dyn ContentFilter>,
    ) -> Self {
        Self {
            sessions,
            store,
            filter,
            history_limit: 50,
            unavailable_message: "Error processing your question. Please try again.".to_string(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_unavailable_message(mut self, message: impl Into<String>) -> Self {
        self.unavailable_message = message.into();
        self
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    async fn session(&self, user_id: &str) -> Result<SharedSession, DomainError> {
        if let Some(session) = self.sessions.get(user_id)? {
            return Ok(session);
        }
        let history: Vec<ConversationTurn> = self
            .store
            .history(user_id, self.history_limit)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        info!(user_id, turns = history.len(), "starting tutor session");
        self.sessions.get_or_create(user_id, history)
    }

    #[instrument(skip(self, message), fields(len = message.len()))]
    pub async fn send(&self, user_id: &str, message: &str) -> Result<ChatReply, DomainError> {
        let user_id = validate_user(user_id)?;
        let message = message.trim();
        if message.is_empty() {
            return Err(DomainError::validation("message must not be empty"));
        }

        let verdict = self.filter.check(message);
        if !verdict.safe {
            info!(user_id, "message rejected by content filter");
            return Ok(ChatReply::Blocked {
                reason: verdict.reason,
            });
        }

        self.store.register_user(user_id).await?;
        let session = self.session(user_id).await?;
        let answer = session.lock().await.ask(message).await;

        let Some(answer) = answer else {
            return Ok(ChatReply::Unavailable {
                message: self.unavailable_message.clone(),
            });
        };

        // The store keeps the raw answer, matching what the session replays.
        if let Err(e) = self.persist_exchange(user_id, message, &answer).await {
            error!(user_id, error = %e, "failed to persist exchange, dropping session");
            self.sessions.remove(user_id)?;
        }
        Ok(ChatReply::Answered {
            answer: self.filter.annotate(answer),
        })
    }

    async fn persist_exchange(
        &self,
        user_id: &str,
        question: &str,
        answer: &str,
    ) -> Result<(), DomainError> {
        self.store.append_turn(user_id, Role::User, question).await?;
        self.store
            .append_turn(user_id, Role::Assistant, answer)
            .await
    }

    pub async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, DomainError> {
        let user_id = validate_user(user_id)?;
        self.store.history(user_id, limit).await
    }

    /// Drops both the stored transcript and the live session.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: &str) -> Result<(), DomainError> {
        let user_id = validate_user(user_id)?;
        self.store.clear_history(user_id).await?;
        if let Some(session) = self.sessions.remove(user_id)? {
            session.lock().await.clear();
        }
        info!(user_id, "conversation cleared");
        Ok(())
    }

    pub async fn stats(&self, user_id: &str) -> Result<UserStats, DomainError> {
        let user_id = validate_user(user_id)?;
        self.store.stats(user_id).await
    }

    pub async fn export(&self, user_id: &str, format: ExportFormat) -> Result<String, DomainError> {
        let user_id = validate_user(user_id)?;
        let turns = self.store.history(user_id, EXPORT_LIMIT).await?;
        if turns.is_empty() {
            warn!(user_id, "exporting empty conversation");
        }
        render_transcript(&turns, format)
    }
}

fn validate_user(user_id: &str) -> Result<&str, DomainError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(DomainError::validation("user_id must not be empty"));
    }
    Ok(user_id)
}
