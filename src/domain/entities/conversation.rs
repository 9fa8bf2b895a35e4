use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Speaker label used when replaying turns into a prompt or transcript.
    pub fn speaker(&self) -> &'static str {
        match self {
            Self::User => "Student",
            Self::Assistant => "Tutor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Active,
}

/// Ordered, append-only turn history of one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Memory {
    turns: Vec<ConversationTurn>,
    updated_at: Option<DateTime<Utc>>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_turns(turns: Vec<ConversationTurn>) -> Self {
        let updated_at = (!turns.is_empty()).then(Utc::now);
        Self { turns, updated_at }
    }

    /// Records a completed exchange: the question first, then its answer.
    pub fn record_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(ConversationTurn::user(question));
        self.turns.push(ConversationTurn::assistant(answer));
        self.updated_at = Some(Utc::now());
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn state(&self) -> SessionState {
        if self.turns.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Active
        }
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_exchange_orders_user_then_assistant() {
        let mut memory = Memory::new();
        assert_eq!(memory.state(), SessionState::Idle);

        memory.record_exchange("What is x?", "x is a variable.");
        memory.record_exchange("And y?", "y is another.");

        assert_eq!(memory.len(), 4);
        assert_eq!(memory.state(), SessionState::Active);
        let roles: Vec<Role> = memory.turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        assert_eq!(memory.turns()[2], ConversationTurn::user("And y?"));
        assert!(memory.updated_at().is_some());
    }

    #[test]
    fn test_clear_returns_to_idle() {
        let mut memory = Memory::from_turns(vec![ConversationTurn::user("hi")]);
        assert_eq!(memory.state(), SessionState::Active);

        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.state(), SessionState::Idle);
        assert!(memory.updated_at().is_none());
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ConversationTurn::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","text":"ok"}"#);
    }
}
