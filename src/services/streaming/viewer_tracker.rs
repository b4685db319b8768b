//! KV-backed viewer presence.
//!
//! Each (tenant, stream) pair has a sorted set whose members are viewer ids
//! scored by their last-heartbeat epoch seconds. Clients heartbeat every
//! ~15 s; a viewer with no heartbeat for VIEWER_TTL_SECS is evicted on the
//! next read. The key's own TTL is refreshed to 4x the viewer TTL on every
//! heartbeat so the whole set self-cleans after silence.

use anyhow::Result;
use std::sync::Arc;

use crate::kv::keys::PresenceKeys;
use crate::kv::KvStore;

pub const VIEWER_TTL_SECS: i64 = 30;

pub struct ViewerTracker {
    kv: Arc<dyn KvStore>,
}

impl ViewerTracker {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    pub async fn heartbeat(&self, tenant_id: &str, stream_id: &str, viewer_id: &str) -> Result<()> {
        let key = PresenceKeys::viewers(tenant_id, stream_id);
        let now = chrono::Utc::now().timestamp();
        self.kv.zadd(&key, now as f64, viewer_id).await?;
        self.kv.expire(&key, (4 * VIEWER_TTL_SECS) as u64).await?;
        Ok(())
    }

    pub async fn remove(&self, tenant_id: &str, stream_id: &str, viewer_id: &str) -> Result<()> {
        let key = PresenceKeys::viewers(tenant_id, stream_id);
        self.kv.zrem(&key, viewer_id).await?;
        Ok(())
    }

    pub async fn count(&self, tenant_id: &str, stream_id: &str) -> Result<u64> {
        let key = PresenceKeys::viewers(tenant_id, stream_id);
        self.evict_expired(&key).await?;
        self.kv.zcard(&key).await
    }

    /// All live viewer ids in ascending heartbeat order.
    pub async fn get_viewers(&self, tenant_id: &str, stream_id: &str) -> Result<Vec<String>> {
        let key = PresenceKeys::viewers(tenant_id, stream_id);
        self.evict_expired(&key).await?;
        self.kv.zrange(&key, 0, -1).await
    }

    pub async fn clear_stream(&self, tenant_id: &str, stream_id: &str) -> Result<()> {
        let key = PresenceKeys::viewers(tenant_id, stream_id);
        self.kv.del(&key).await
    }

    async fn evict_expired(&self, key: &str) -> Result<()> {
        let cutoff = chrono::Utc::now().timestamp() - VIEWER_TTL_SECS;
        self.kv
            .zrem_range_by_score(key, f64::MIN, cutoff as f64)
            .await?;
        Ok(())
    }
}
