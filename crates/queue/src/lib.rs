//! Task queue and distributed-lock infrastructure.
//!
//! The queue is durable (Postgres `tasks` table, claimed with
//! `FOR UPDATE SKIP LOCKED`); the lock store is a shared key-value store
//! (Redis) reachable by every worker process.

pub mod lock;
pub mod tasks;

pub use lock::{LockStore, MemoryLockStore, RedisLockStore};
pub use tasks::{TaskName, TaskQueue, TaskSpec};
