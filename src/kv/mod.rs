//! Shared key-value store abstraction.
//!
//! Everything that must be observable across workers (active streams,
//! stream keys, viewer presence, chat moderation state) goes through the
//! narrow [`KvStore`] capability surface. Production backs it with Redis;
//! the test suite backs it with an in-process store.

pub mod keys;
pub mod memory;
pub mod redis_store;

pub use memory::MemoryKv;
pub use redis_store::RedisKv;

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait KvStore: Send + Sync {
    // Strings
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<()>;
    /// Set-if-absent with TTL in a single round trip. Returns true when the
    /// key was created, false when it already existed.
    async fn set_nx_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<bool>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn del(&self, key: &str) -> Result<()>;

    // Hashes
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;
    async fn hdel(&self, key: &str, field: &str) -> Result<()>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    // Sets
    async fn sadd(&self, key: &str, member: &str) -> Result<()>;
    async fn srem(&self, key: &str, member: &str) -> Result<()>;
    async fn smembers(&self, key: &str) -> Result<Vec<String>>;
    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;

    /// Refresh the TTL of an existing key. A missing key is not an error.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()>;

    // Sorted sets
    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()>;
    async fn zrem(&self, key: &str, member: &str) -> Result<()>;
    /// Remove members with score in `[min, max]`, returning how many went.
    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64>;
    async fn zcard(&self, key: &str) -> Result<u64>;
    /// Members in ascending score order; `stop = -1` means the last member.
    async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;
}
