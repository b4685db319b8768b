//! In-process implementation of [`KvStore`].
//!
//! Used by the test suite in place of Redis. TTLs run against a logical
//! clock that tests can move forward with [`MemoryKv::advance`], so
//! expiry behavior (slow-mode tokens, presence keys) is testable without
//! sleeping.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::KvStore;

#[derive(Default)]
struct MemState {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    sets: HashMap<String, HashSet<String>>,
    zsets: HashMap<String, HashMap<String, f64>>,
    /// Expiry deadlines in logical milliseconds, shared by all key types.
    deadlines: HashMap<String, u64>,
}

impl MemState {
    fn drop_key(&mut self, key: &str) {
        self.strings.remove(key);
        self.hashes.remove(key);
        self.sets.remove(key);
        self.zsets.remove(key);
        self.deadlines.remove(key);
    }

    fn purge_expired(&mut self, key: &str, now_ms: u64) {
        if let Some(&deadline) = self.deadlines.get(key) {
            if deadline <= now_ms {
                self.drop_key(key);
            }
        }
    }

    fn exists(&self, key: &str) -> bool {
        self.strings.contains_key(key)
            || self.hashes.contains_key(key)
            || self.sets.contains_key(key)
            || self.zsets.contains_key(key)
    }
}

pub struct MemoryKv {
    state: Mutex<MemState>,
    start: Instant,
    skew_ms: AtomicU64,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemState::default()),
            start: Instant::now(),
            skew_ms: AtomicU64::new(0),
        }
    }

    /// Move the logical clock forward, expiring keys whose TTL has lapsed.
    pub fn advance(&self, by: Duration) {
        self.skew_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64 + self.skew_ms.load(Ordering::SeqCst)
    }
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.drop_key(key);
        state.strings.insert(key.to_string(), value.to_string());
        state
            .deadlines
            .insert(key.to_string(), now + ttl_seconds * 1_000);
        Ok(())
    }

    async fn set_nx_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<bool> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        if state.strings.contains_key(key) {
            return Ok(false);
        }
        state.strings.insert(key.to_string(), value.to_string());
        state
            .deadlines
            .insert(key.to_string(), now + ttl_seconds * 1_000);
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        Ok(state.strings.get(key).cloned())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.drop_key(key);
        Ok(())
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        state
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        if let Some(hash) = state.hashes.get_mut(key) {
            hash.remove(field);
            if hash.is_empty() {
                state.hashes.remove(key);
            }
        }
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        Ok(state.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        state
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        if let Some(set) = state.sets.get_mut(key) {
            set.remove(member);
            if set.is_empty() {
                state.sets.remove(key);
            }
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        Ok(state
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        Ok(state.sets.get(key).is_some_and(|s| s.contains(member)))
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        if state.exists(key) {
            state
                .deadlines
                .insert(key.to_string(), now + ttl_seconds * 1_000);
        }
        Ok(())
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        state
            .zsets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string(), score);
        Ok(())
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        if let Some(zset) = state.zsets.get_mut(key) {
            zset.remove(member);
            if zset.is_empty() {
                state.zsets.remove(key);
            }
        }
        Ok(())
    }

    async fn zrem_range_by_score(&self, key: &str, min: f64, max: f64) -> Result<u64> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        let mut removed = 0;
        if let Some(zset) = state.zsets.get_mut(key) {
            let before = zset.len();
            zset.retain(|_, score| *score < min || *score > max);
            removed = (before - zset.len()) as u64;
            if zset.is_empty() {
                state.zsets.remove(key);
            }
        }
        Ok(removed)
    }

    async fn zcard(&self, key: &str) -> Result<u64> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        Ok(state.zsets.get(key).map(|z| z.len() as u64).unwrap_or(0))
    }

    async fn zrange(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let now = self.now_ms();
        let mut state = self.state.lock().await;
        state.purge_expired(key, now);
        let Some(zset) = state.zsets.get(key) else {
            return Ok(Vec::new());
        };

        let mut members: Vec<(&String, f64)> = zset.iter().map(|(m, s)| (m, *s)).collect();
        members.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        let len = members.len() as isize;
        let norm = |i: isize| if i < 0 { len + i } else { i };
        let from = norm(start).max(0);
        let to = norm(stop).min(len - 1);
        if from > to || len == 0 {
            return Ok(Vec::new());
        }

        Ok(members[from as usize..=to as usize]
            .iter()
            .map(|(m, _)| (*m).clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_nx_ex_is_one_shot_until_expiry() {
        let kv = MemoryKv::new();
        assert!(kv.set_nx_ex("token", 5, "1").await.unwrap());
        assert!(!kv.set_nx_ex("token", 5, "1").await.unwrap());

        kv.advance(Duration::from_secs(6));
        assert!(kv.set_nx_ex("token", 5, "1").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_honors_ttl() {
        let kv = MemoryKv::new();
        kv.set_ex("k", 10, "v").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));

        kv.advance(Duration::from_secs(11));
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_zrange_is_score_ordered() {
        let kv = MemoryKv::new();
        kv.zadd("z", 3.0, "c").await.unwrap();
        kv.zadd("z", 1.0, "a").await.unwrap();
        kv.zadd("z", 2.0, "b").await.unwrap();

        let all = kv.zrange("z", 0, -1).await.unwrap();
        assert_eq!(all, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_zrem_range_by_score_is_inclusive() {
        let kv = MemoryKv::new();
        kv.zadd("z", 1.0, "a").await.unwrap();
        kv.zadd("z", 2.0, "b").await.unwrap();
        kv.zadd("z", 3.0, "c").await.unwrap();

        let removed = kv.zrem_range_by_score("z", f64::MIN, 2.0).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(kv.zrange("z", 0, -1).await.unwrap(), vec!["c"]);
    }
}
