//! Distributed locks for at-most-once side effects.
//!
//! A lock is a key in a shared store with a TTL. Acquisition is a single
//! atomic set-if-absent; the TTL guarantees a crashed holder cannot wedge
//! the key forever. Holders release explicitly on every exit path, but a
//! missed release only delays the next attempt by the TTL.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

/// Value written under a held lock key.
const LOCK_VALUE: &str = "processing";

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock store unavailable: {0}")]
    Store(#[from] redis::RedisError),
}

/// Shared mutual-exclusion store visible to every worker process.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Try to acquire `key` for `ttl`. Returns `false` if another holder
    /// currently owns it.
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool, LockError>;

    /// Release `key`. Releasing a key that is not held is a no-op.
    async fn release(&self, key: &str) -> Result<(), LockError>;
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

/// Redis-backed lock store, the production implementation.
#[derive(Clone)]
pub struct RedisLockStore {
    conn: redis::aio::ConnectionManager,
}

impl RedisLockStore {
    pub async fn connect(url: &str) -> Result<Self, LockError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool, LockError> {
        let mut conn = self.conn.clone();
        // SET key value NX EX ttl: atomic set-if-absent with expiry.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(LOCK_VALUE)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn release(&self, key: &str) -> Result<(), LockError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("DEL").arg(key).query_async(&mut conn).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory (tests)
// ---------------------------------------------------------------------------

/// Process-local lock store for tests. Same acquire/release semantics as
/// the Redis store, including TTL expiry.
#[derive(Default)]
pub struct MemoryLockStore {
    held: Mutex<HashMap<String, Instant>>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for MemoryLockStore {
    async fn acquire(&self, key: &str, ttl: Duration) -> Result<bool, LockError> {
        let mut held = self.held.lock().unwrap();
        let now = Instant::now();
        match held.get(key) {
            Some(deadline) if *deadline > now => Ok(false),
            _ => {
                held.insert(key.to_string(), now + ttl);
                Ok(true)
            }
        }
    }

    async fn release(&self, key: &str) -> Result<(), LockError> {
        self.held.lock().unwrap().remove(key);
        Ok(())
    }
}
