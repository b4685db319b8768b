//! Key naming conventions for the shared store.
//!
//! Every key except the `active_streams` hash is tenant-scoped.

/// Stream lifecycle keys.
pub struct StreamKeys;

impl StreamKeys {
    /// Secret stream key for a (tenant, stream) pair.
    pub fn stream_key(tenant_id: &str, stream_id: &str) -> String {
        format!("stream_key:{}:{}", tenant_id, stream_id)
    }

    /// Hash of all live streams across workers, field = stream id.
    pub fn active_streams() -> &'static str {
        "active_streams"
    }
}

/// Viewer presence keys.
pub struct PresenceKeys;

impl PresenceKeys {
    /// Sorted set of viewer ids scored by last-heartbeat epoch seconds.
    pub fn viewers(tenant_id: &str, stream_id: &str) -> String {
        format!("stream_viewers:{}:{}", tenant_id, stream_id)
    }
}

/// Chat moderation keys.
pub struct ChatKeys;

impl ChatKeys {
    /// Set of banned user ids.
    pub fn bans(tenant_id: &str, stream_id: &str) -> String {
        format!("chat_ban:{}:{}", tenant_id, stream_id)
    }

    /// Set of lower-cased banned substrings.
    pub fn filters(tenant_id: &str, stream_id: &str) -> String {
        format!("chat_filter:{}:{}", tenant_id, stream_id)
    }

    /// One-shot slow-mode token for a user.
    pub fn slow_mode(tenant_id: &str, stream_id: &str, user_id: &str) -> String {
        format!("chat_slow:{}:{}:{}", tenant_id, stream_id, user_id)
    }
}
