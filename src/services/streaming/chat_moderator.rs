//! Per-message chat admission.
//!
//! Checks run in a fixed order and the first failure wins: length, empty
//! after trim, ban set, word filter, slow-mode token. Bans and filters are
//! tenant-and-stream scoped and persist until cleared; the slow-mode token
//! is a set-if-absent KV write with the slow-mode window as its TTL.

use anyhow::Result;
use std::sync::Arc;

use crate::kv::keys::ChatKeys;
use crate::kv::KvStore;

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatVerdict {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl ChatVerdict {
    fn allowed() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    fn rejected(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

pub struct ChatModerator {
    kv: Arc<dyn KvStore>,
    max_message_length: usize,
    slow_mode_seconds: u64,
}

impl ChatModerator {
    pub fn new(kv: Arc<dyn KvStore>, max_message_length: usize, slow_mode_seconds: u64) -> Self {
        Self {
            kv,
            max_message_length,
            slow_mode_seconds,
        }
    }

    pub async fn validate(
        &self,
        tenant_id: &str,
        stream_id: &str,
        user_id: &str,
        message: &str,
    ) -> Result<ChatVerdict> {
        if message.len() > self.max_message_length {
            return Ok(ChatVerdict::rejected(format!(
                "Message too long (max {} chars)",
                self.max_message_length
            )));
        }

        if message.trim().is_empty() {
            return Ok(ChatVerdict::rejected("Message is empty"));
        }

        let bans = ChatKeys::bans(tenant_id, stream_id);
        if self.kv.sismember(&bans, user_id).await? {
            return Ok(ChatVerdict::rejected("You are banned from this chat"));
        }

        let filters = ChatKeys::filters(tenant_id, stream_id);
        let lowered = message.to_lowercase();
        for word in self.kv.smembers(&filters).await? {
            if lowered.contains(&word) {
                return Ok(ChatVerdict::rejected("Message contains prohibited content"));
            }
        }

        if self.slow_mode_seconds > 0 {
            let token = ChatKeys::slow_mode(tenant_id, stream_id, user_id);
            let acquired = self
                .kv
                .set_nx_ex(&token, self.slow_mode_seconds, "1")
                .await?;
            if !acquired {
                return Ok(ChatVerdict::rejected(format!(
                    "Slow mode: wait {}s between messages",
                    self.slow_mode_seconds
                )));
            }
        }

        Ok(ChatVerdict::allowed())
    }

    /// Ban a user from a stream's chat, optionally for a limited time.
    /// A TTL applies to the whole ban set and refreshes on every TTL'd ban.
    pub async fn ban(
        &self,
        tenant_id: &str,
        stream_id: &str,
        user_id: &str,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let key = ChatKeys::bans(tenant_id, stream_id);
        self.kv.sadd(&key, user_id).await?;
        if let Some(ttl) = ttl_seconds {
            self.kv.expire(&key, ttl).await?;
        }
        Ok(())
    }

    pub async fn unban(&self, tenant_id: &str, stream_id: &str, user_id: &str) -> Result<()> {
        let key = ChatKeys::bans(tenant_id, stream_id);
        self.kv.srem(&key, user_id).await
    }

    /// Add a banned substring; matching is case-insensitive.
    pub async fn add_filter(&self, tenant_id: &str, stream_id: &str, word: &str) -> Result<()> {
        let key = ChatKeys::filters(tenant_id, stream_id);
        self.kv.sadd(&key, &word.to_lowercase()).await
    }

    pub async fn remove_filter(&self, tenant_id: &str, stream_id: &str, word: &str) -> Result<()> {
        let key = ChatKeys::filters(tenant_id, stream_id);
        self.kv.srem(&key, &word.to_lowercase()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;
    use std::time::Duration;

    fn moderator(max_len: usize, slow: u64) -> (Arc<MemoryKv>, ChatModerator) {
        let kv = Arc::new(MemoryKv::new());
        let m = ChatModerator::new(kv.clone(), max_len, slow);
        (kv, m)
    }

    #[tokio::test]
    async fn test_length_boundary() {
        let (_kv, m) = moderator(5, 0);

        let at_limit = m.validate("t", "s", "u", "12345").await.unwrap();
        assert!(at_limit.allowed);

        let over = m.validate("t", "s", "u", "123456").await.unwrap();
        assert!(!over.allowed);
        assert!(over.reason.unwrap().starts_with("Message too long"));
    }

    #[tokio::test]
    async fn test_empty_after_trim_rejected() {
        let (_kv, m) = moderator(500, 0);
        let verdict = m.validate("t", "s", "u", "   ").await.unwrap();
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason.as_deref(), Some("Message is empty"));
    }

    #[tokio::test]
    async fn test_banned_user_rejected() {
        let (_kv, m) = moderator(500, 0);
        m.ban("t", "s", "troll", None).await.unwrap();

        let verdict = m.validate("t", "s", "troll", "hello").await.unwrap();
        assert!(!verdict.allowed);
        assert_eq!(
            verdict.reason.as_deref(),
            Some("You are banned from this chat")
        );

        // Other tenants are unaffected.
        assert!(m.validate("t2", "s", "troll", "hello").await.unwrap().allowed);

        m.unban("t", "s", "troll").await.unwrap();
        assert!(m.validate("t", "s", "troll", "hello").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_word_filter_is_case_insensitive() {
        let (_kv, m) = moderator(500, 0);
        m.add_filter("t", "s", "Spam").await.unwrap();

        let verdict = m.validate("t", "s", "u", "free SPAM here").await.unwrap();
        assert!(!verdict.allowed);

        m.remove_filter("t", "s", "spam").await.unwrap();
        assert!(m.validate("t", "s", "u", "free SPAM here").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_slow_mode_window() {
        let (kv, m) = moderator(500, 5);

        assert!(m.validate("t", "s", "u", "hi").await.unwrap().allowed);

        let second = m.validate("t", "s", "u", "hi").await.unwrap();
        assert!(!second.allowed);
        assert!(second.reason.unwrap().starts_with("Slow mode"));

        // A different user is not throttled by u's token.
        assert!(m.validate("t", "s", "other", "hi").await.unwrap().allowed);

        kv.advance(Duration::from_secs(5));
        assert!(m.validate("t", "s", "u", "hi").await.unwrap().allowed);
    }

    #[tokio::test]
    async fn test_check_order_first_failure_wins() {
        let (_kv, m) = moderator(5, 5);
        m.ban("t", "s", "u", None).await.unwrap();

        // Over-length message from a banned user reports the length failure.
        let verdict = m.validate("t", "s", "u", "123456").await.unwrap();
        assert!(verdict.reason.unwrap().starts_with("Message too long"));
    }
}
