use async_trait::async_trait;

use crate::domain::{errors::DomainError, Role, StoredTurn, UserStats};

#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Creates the user record, or refreshes its last-active time.
    async fn register_user(&self, user_id: &str) -> Result<(), DomainError>;
    async fn append_turn(&self, user_id: &str, role: Role, text: &str)
        -> Result<(), DomainError>;
    /// The most recent `limit` turns, oldest first.
    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, DomainError>;
    async fn clear_history(&self, user_id: &str) -> Result<(), DomainError>;
    async fn stats(&self, user_id: &str) -> Result<UserStats, DomainError>;

    async fn ping(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
