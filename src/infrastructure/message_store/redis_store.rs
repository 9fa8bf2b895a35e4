use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_redis::{redis::cmd, redis::AsyncCommands, Config, Connection, Pool, Runtime};
use std::collections::HashMap;

use crate::domain::{ports::MessageStore, DomainError, Role, StoredTurn, UserStats};

pub type RedisPool = Pool;

pub mod keys {
    pub fn history(user_id: &str) -> String {
        format!("tutor:history:{}", user_id)
    }

    pub fn user(user_id: &str) -> String {
        format!("tutor:user:{}", user_id)
    }
}

const CREATED_AT: &str = "created_at";
const LAST_ACTIVE: &str = "last_active";

pub fn create_pool(redis_url: &str) -> Result<RedisPool, DomainError> {
    let cfg = Config::from_url(redis_url);
    cfg.create_pool(Some(Runtime::Tokio1))
        .map_err(|e| DomainError::external(format!("Redis pool error: {e}")))
}

/// Transcript store backed by one Redis list per user plus a hash holding
/// the user's creation and last-activity timestamps.
#[derive(Clone)]
pub struct RedisMessageStore {
    pool: RedisPool,
}

impl RedisMessageStore {
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<Connection, DomainError> {
        self.pool
            .get()
            .await
            .map_err(|e| DomainError::external(format!("Redis pool error: {e}")))
    }
}

fn redis_err(e: impl std::fmt::Display) -> DomainError {
    DomainError::external(format!("Redis error: {e}"))
}

fn parse_time(raw: Option<&String>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

#[async_trait]
impl MessageStore for RedisMessageStore {
    async fn register_user(&self, user_id: &str) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        let now = Utc::now().to_rfc3339();
        let key = keys::user(user_id);

        conn.hset_nx::<_, _, _, ()>(&key, CREATED_AT, &now)
            .await
            .map_err(redis_err)?;
        conn.hset::<_, _, _, ()>(&key, LAST_ACTIVE, &now)
            .await
            .map_err(redis_err)
    }

    async fn append_turn(
        &self,
        user_id: &str,
        role: Role,
        text: &str,
    ) -> Result<(), DomainError> {
        let turn = StoredTurn::new(role, text);
        let json = serde_json::to_string(&turn).map_err(|e| DomainError::internal(e.to_string()))?;
        let mut conn = self.conn().await?;

        conn.rpush::<_, _, ()>(keys::history(user_id), &json)
            .await
            .map_err(redis_err)?;
        conn.hset::<_, _, _, ()>(keys::user(user_id), LAST_ACTIVE, turn.timestamp.to_rfc3339())
            .await
            .map_err(redis_err)
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<StoredTurn>, DomainError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn().await?;
        let start = -(limit.min(isize::MAX as usize) as isize);
        let raw: Vec<String> = conn
            .lrange(keys::history(user_id), start, -1)
            .await
            .map_err(redis_err)?;

        raw.iter()
            .map(|json| {
                serde_json::from_str(json).map_err(|e| {
                    DomainError::internal(format!("malformed turn for {user_id}: {e}"))
                })
            })
            .collect()
    }

    async fn clear_history(&self, user_id: &str) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(keys::history(user_id))
            .await
            .map_err(redis_err)
    }

    async fn stats(&self, user_id: &str) -> Result<UserStats, DomainError> {
        let mut conn = self.conn().await?;
        let total: usize = conn
            .llen(keys::history(user_id))
            .await
            .map_err(redis_err)?;
        let fields: HashMap<String, String> = conn
            .hgetall(keys::user(user_id))
            .await
            .map_err(redis_err)?;

        Ok(UserStats {
            total_messages: total,
            created_at: parse_time(fields.get(CREATED_AT)),
            last_active: parse_time(fields.get(LAST_ACTIVE)),
        })
    }

    async fn ping(&self) -> Result<(), DomainError> {
        let mut conn = self.conn().await?;
        let _: String = cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(redis_err)?;
        Ok(())
    }
}
