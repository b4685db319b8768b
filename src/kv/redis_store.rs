//! Redis-backed implementation of the [`KvStore`] capability surface.

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;

use super::KvStore;

#[derive(Clone)]
pub struct RedisKv {
    redis: ConnectionManager,
}

impl RedisKv {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).context("failed to construct Redis client")?;
        let manager = ConnectionManager::new(client)
            .await
            .context("failed to initialize Redis connection manager")?;
        Ok(Self::new(manager))
    }
}

#[async_trait]
impl KvStore for RedisKv {
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .with_context(|| format!("failed to SETEX '{}'", key))?;
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<bool> {
        let mut conn = self.redis.clone();
        // SET key value NX EX ttl replies OK on create, nil when present.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_seconds)
            .query_async(&mut conn)
            .await
            .with_context(|| format!("failed to SET NX EX '{}'", key))?;
        Ok(reply.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn
            .get(key)
            .await
            .with_context(|| format!("failed to GET '{}'", key))?;
        Ok(value)
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.del::<_, ()>(key)
            .await
            .with_context(|| format!("failed to DEL '{}'", key))?;
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.hset::<_, _, _, ()>(key, field, value)
            .await
            .with_context(|| format!("failed to HSET '{}' '{}'", key, field))?;
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.hdel::<_, _, ()>(key, field)
            .await
            .with_context(|| format!("failed to HDEL '{}' '{}'", key, field))?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let mut conn = self.redis.clone();
        let map: HashMap<String, String> = conn
            .hgetall(key)
            .await
            .with_context(|| format!("failed to HGETALL '{}'", key))?;
        Ok(map)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.sadd::<_, _, ()>(key, member)
            .await
            .with_context(|| format!("failed to SADD '{}'", key))?;
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.srem::<_, _, ()>(key, member)
            .await
            .with_context(|| format!("failed to SREM '{}'", key))?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.redis.clone();
        let members: Vec<String> = conn
            .smembers(key)
            .await
            .with_context(|| format!("failed to SMEMBERS '{}'", key))?;
        Ok(members)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let mut conn = self.redis.clone();
        let is_member: bool = conn
            .sismember(key, member)
            .await
            .with_context(|| format!("failed to SISMEMBER '{}'", key))?;
        Ok(is_member)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.expire::<_, bool>(key, ttl_seconds as i64)
            .await
            .with_context(|| format!("failed to EXPIRE '{}'", key))?;
        Ok(())
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.zadd::<_, _, _, ()>(key, member, score)
            .await
            .with_context(|| format!("failed to ZADD '{}'", key))?;
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut conn = self.redis.clone();
        conn.zrem::<_, _, ()>(key, member)
            .await
            .with_context(|| format!("failed to ZREM '{}'", key))?;
        Ok(())
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let mut conn = self.redis.clone();
        let removed: u64 = conn
            .zrembyscore(key, min, max)
            .await
            .with_context(|| format!("failed to ZREMRANGEBYSCORE '{}'", key))?;
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let mut conn = self.redis.clone();
        let card: u64 = conn
            .zcard(key)
            .await
            .with_context(|| format!("failed to ZCARD '{}'", key))?;
        Ok(card)
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.redis.clone();
        let members: Vec<String> = conn
            .zrange(key, start, stop)
            .await
            .with_context(|| format!("failed to ZRANGE '{}'", key))?;
        Ok(members)
    }
}
