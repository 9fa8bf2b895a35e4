use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationTurn, Role};

/// A turn as held by the message store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTurn {
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl StoredTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

impl From<StoredTurn> for ConversationTurn {
    fn from(turn: StoredTurn) -> Self {
        ConversationTurn::new(turn.role, turn.text)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_messages: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub last_active: Option<DateTime<Utc>>,
}
