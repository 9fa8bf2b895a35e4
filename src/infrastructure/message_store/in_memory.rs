use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::{ports::MessageStore, DomainError, Role, StoredTurn, UserStats};

#[derive(Default)]
struct UserRecord {
    turns: Vec<StoredTurn>,
    stats: UserStats,
}

/// Process-local store; transcripts are lost on restart.
#[derive(Default)]
pub struct InMemoryMessageStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn register_user(&self, user_id: &str) -> Result<(), DomainError> {
        let now = Utc::now();
        let mut users = self.users.write().await;
        let record = users.entry(user_id.to_string()).or_default();
        record.stats.created_at.get_or_insert(now);
        record.stats.last_active = Some(now);
        Ok(())
    }

    async fn append_turn(
        &self,
        user_id: &str,
        role: Role,
        text: &str,
    ) -> Result<(), DomainError> {
        let turn = StoredTurn::new(role, text);
        let mut users = self.users.write().await;
        let record = users.entry(user_id.to_string()).or_default();
        record.stats.last_active = Some(turn.timestamp);
        record.turns.push(turn);
        Ok(())
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|record| {
                let skip = record.turns.len().saturating_sub(limit);
                record.turns[skip..].to_vec()
            })
            .unwrap_or_default())
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), DomainError> {
        if let Some(record) = self.users.write().await.get_mut(user_id) {
            record.turns.clear();
        }
        Ok(())
    }

    async fn stats(&self, user_id: &str) -> Result<UserStats, DomainError> {
        let users = self.users.read().await;
        Ok(users
            .get(user_id)
            .map(|record| UserStats {
                total_messages: record.turns.len(),
                ..record.stats.clone()
            })
            .unwrap_or_default())
    }
}
