//! Stream lifecycle management.
//!
//! The manager owns the worker-local stream records and mirrors the
//! globally-observable slices into the shared KV store: the secret stream
//! key under its own TTL'd entry, and live streams into the
//! `active_streams` hash. Writes are ordered local-first; a failed KV write
//! rolls the local record back so no reader can surface split state.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::kv::keys::StreamKeys;
use crate::kv::KvStore;
use crate::security::{generate_stream_id, generate_stream_key, verify_stream_key};
use crate::services::streaming::models::{StreamManagerStats, StreamRecord, StreamStatus};

/// Narrow validation capability handed to the signaling router, so the
/// router does not depend on the whole manager.
#[async_trait]
pub trait StreamKeyValidator: Send + Sync {
    async fn validate_stream_key(
        &self,
        tenant_id: &str,
        stream_id: &str,
        stream_key: &str,
    ) -> Result<bool>;
}

pub struct StreamManager {
    kv: Arc<dyn KvStore>,
    streams: RwLock<HashMap<String, StreamRecord>>,
    stream_key_ttl: u64,
}

impl StreamManager {
    pub fn new(kv: Arc<dyn KvStore>, stream_key_ttl: u64) -> Self {
        Self {
            kv,
            streams: RwLock::new(HashMap::new()),
            stream_key_ttl,
        }
    }

    /// Create a stream with a fresh id and secret key.
    ///
    /// The key is written to the KV store with the configured TTL; if that
    /// write fails the local record is rolled back and the error propagates.
    pub async fn create_stream(
        &self,
        tenant_id: &str,
        user_id: &str,
        title: &str,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<(String, String)> {
        let stream_id = generate_stream_id();
        let stream_key = generate_stream_key();

        let record = StreamRecord {
            stream_id: stream_id.clone(),
            tenant_id: tenant_id.to_string(),
            user_id: user_id.to_string(),
            stream_key: stream_key.clone(),
            status: StreamStatus::Pending,
            title: title.to_string(),
            started_at: None,
            ended_at: None,
            created_at: chrono::Utc::now().timestamp(),
            metadata,
        };

        {
            let mut streams = self.streams.write().await;
            streams.insert(stream_id.clone(), record);
        }

        let key = StreamKeys::stream_key(tenant_id, &stream_id);
        if let Err(e) = self.kv.set_ex(&key, self.stream_key_ttl, &stream_key).await {
            let mut streams = self.streams.write().await;
            streams.remove(&stream_id);
            return Err(e);
        }

        tracing::info!(stream_id, tenant_id, user_id, "stream created");
        Ok((stream_id, stream_key))
    }

    /// Constant-time stream-key check against the KV-stored value.
    pub async fn validate_stream_key(
        &self,
        tenant_id: &str,
        stream_id: &str,
        stream_key: &str,
    ) -> Result<bool> {
        if stream_key.is_empty() {
            return Ok(false);
        }
        let key = StreamKeys::stream_key(tenant_id, stream_id);
        match self.kv.get(&key).await? {
            Some(stored) => Ok(verify_stream_key(&stored, stream_key)),
            None => Ok(false),
        }
    }

    /// Transition pending -> live and publish the record into the
    /// `active_streams` hash. Returns false for unknown streams and for
    /// any non-advancing transition.
    pub async fn start_stream(&self, stream_id: &str) -> Result<bool> {
        let (previous, serialized) = {
            let mut streams = self.streams.write().await;
            let Some(record) = streams.get_mut(stream_id) else {
                return Ok(false);
            };
            if !record.status.can_advance_to(StreamStatus::Live) {
                return Ok(false);
            }
            let previous = (record.status, record.started_at);
            record.status = StreamStatus::Live;
            record.started_at = Some(chrono::Utc::now().timestamp());
            (previous, serde_json::to_string(record)?)
        };

        if let Err(e) = self
            .kv
            .hset(StreamKeys::active_streams(), stream_id, &serialized)
            .await
        {
            let mut streams = self.streams.write().await;
            if let Some(record) = streams.get_mut(stream_id) {
                (record.status, record.started_at) = previous;
            }
            return Err(e);
        }

        tracing::info!(stream_id, "stream live");
        Ok(true)
    }

    /// Transition to ended, remove the KV hash entry and the stream key.
    pub async fn end_stream(&self, stream_id: &str) -> Result<bool> {
        let (tenant_id, previous) = {
            let mut streams = self.streams.write().await;
            let Some(record) = streams.get_mut(stream_id) else {
                return Ok(false);
            };
            if !record.status.can_advance_to(StreamStatus::Ended) {
                return Ok(false);
            }
            let previous = (record.status, record.ended_at);
            record.status = StreamStatus::Ended;
            record.ended_at = Some(chrono::Utc::now().timestamp());
            (record.tenant_id.clone(), previous)
        };

        let unpublish = async {
            self.kv
                .hdel(StreamKeys::active_streams(), stream_id)
                .await?;
            self.kv
                .del(&StreamKeys::stream_key(&tenant_id, stream_id))
                .await
        };

        if let Err(e) = unpublish.await {
            let mut streams = self.streams.write().await;
            if let Some(record) = streams.get_mut(stream_id) {
                (record.status, record.ended_at) = previous;
            }
            return Err(e);
        }

        tracing::info!(stream_id, "stream ended");
        Ok(true)
    }

    pub async fn get_stream(&self, stream_id: &str) -> Option<StreamRecord> {
        let streams = self.streams.read().await;
        streams.get(stream_id).cloned()
    }

    /// Live streams owned by this worker, for one tenant.
    pub async fn get_live_streams(&self, tenant_id: &str) -> Vec<StreamRecord> {
        let streams = self.streams.read().await;
        streams
            .values()
            .filter(|r| r.status == StreamStatus::Live && r.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    /// Live streams across all workers, read from the KV mirror.
    pub async fn get_all_active_streams(&self) -> Result<Vec<StreamRecord>> {
        let entries = self.kv.hgetall(StreamKeys::active_streams()).await?;
        let mut records = Vec::with_capacity(entries.len());
        for (stream_id, raw) in entries {
            match serde_json::from_str::<StreamRecord>(&raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(stream_id, "skipping unparseable active stream entry: {e}")
                }
            }
        }
        Ok(records)
    }

    pub async fn stats(&self) -> StreamManagerStats {
        let streams = self.streams.read().await;
        let mut stats = StreamManagerStats {
            total: streams.len(),
            pending: 0,
            live: 0,
            ended: 0,
        };
        for record in streams.values() {
            match record.status {
                StreamStatus::Pending => stats.pending += 1,
                StreamStatus::Live => stats.live += 1,
                StreamStatus::Ended => stats.ended += 1,
            }
        }
        stats
    }
}

#[async_trait]
impl StreamKeyValidator for StreamManager {
    async fn validate_stream_key(
        &self,
        tenant_id: &str,
        stream_id: &str,
        stream_key: &str,
    ) -> Result<bool> {
        StreamManager::validate_stream_key(self, tenant_id, stream_id, stream_key).await
    }
}
