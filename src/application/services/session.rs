use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as SessionLock;
use tracing::debug;

use crate::application::services::prompt::PromptTemplate;
use crate::application::services::rag::Retriever;
use crate::application::services::tutor::TutorSession;
use crate::domain::{ports::LlmService, ConversationTurn, DomainError};

pub type SharedSession = Arc<SessionLock<TutorSession>>;

pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Independent tutor sessions keyed by user. Each session sits behind its
/// own async lock; the shared retriever and model client are read-only.
///
/// At most `max_sessions` are held. Creating one more evicts the session
/// that has been quiet longest; sessions in the middle of an `ask` are
/// never evicted. An evicted user resumes from the message store.
pub struct SessionRegistry {
    retriever: Arc<Retriever>,
    llm: Arc<dyn LlmService>,
    template: Arc<PromptTemplate>,
    max_sessions: usize,
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionRegistry {
    pub fn new(
        retriever: Arc<Retriever>,
        llm: Arc<dyn LlmService>,
        template: Arc<PromptTemplate>,
    ) -> Self {
        Self {
            retriever,
            llm,
            template,
            max_sessions: DEFAULT_MAX_SESSIONS,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, SharedSession>>, DomainError> {
        self.sessions
            .lock()
            .map_err(|e| DomainError::internal(e.to_string()))
    }

    pub fn get(&self, user_id: &str) -> Result<Option<SharedSession>, DomainError> {
        Ok(self.lock()?.get(user_id).cloned())
    }

    /// Returns the user's session, creating it from `history` if absent.
    /// When two callers race, the first insert wins and both get it.
    pub fn get_or_create(
        &self,
        user_id: &str,
        history: Vec<ConversationTurn>,
    ) -> Result<SharedSession, DomainError> {
        let mut sessions = self.lock()?;
        if let Some(session) = sessions.get(user_id) {
            return Ok(session.clone());
        }
        if sessions.len() >= self.max_sessions {
            evict_idlest(&mut sessions);
        }

        let tutor = TutorSession::new(
            self.retriever.clone(),
            self.llm.clone(),
            self.template.clone(),
        )
        .resume(history);
        let session = Arc::new(SessionLock::new(tutor));
        sessions.insert(user_id.to_string(), session.clone());
        Ok(session)
    }

    pub fn remove(&self, user_id: &str) -> Result<Option<SharedSession>, DomainError> {
        Ok(self.lock()?.remove(user_id))
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sessions that never answered go first, then the oldest `updated_at`.
fn evict_idlest(sessions: &mut HashMap<String, SharedSession>) {
    let idlest: Option<(Option<DateTime<Utc>>, String)> = sessions
        .iter()
        .filter_map(|(user_id, session)| {
            let updated_at = session.try_lock().ok()?.updated_at();
            Some((updated_at, user_id.clone()))
        })
        .min();

    if let Some((_, user_id)) = idlest {
        sessions.remove(&user_id);
        debug!(user_id = %user_id, "evicted idle tutor session");
    }
}
