//! Data models for the streaming orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// =============================================================================
// Stream Status
// =============================================================================

/// Stream lifecycle status. Transitions only ever advance:
/// pending -> live -> ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    /// Created, broadcaster not yet transmitting.
    Pending,
    /// Broadcaster connected and transmitting.
    Live,
    /// Stream ended.
    Ended,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Live => "live",
            Self::Ended => "ended",
        }
    }

    /// Whether a transition from `self` to `next` advances the lifecycle.
    pub fn can_advance_to(self, next: StreamStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Live) | (Self::Pending, Self::Ended) | (Self::Live, Self::Ended)
        )
    }
}

// =============================================================================
// Stream Record
// =============================================================================

/// A stream as owned by the worker that created it. The serialized form is
/// what gets mirrored into the `active_streams` KV hash; the secret stream
/// key never leaves this process (it lives in its own KV entry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub stream_id: String,
    pub tenant_id: String,
    pub user_id: String,
    #[serde(skip)]
    pub stream_key: String,
    pub status: StreamStatus,
    pub title: String,
    /// Epoch seconds; set exactly once, when the stream goes live.
    pub started_at: Option<i64>,
    /// Epoch seconds; set when the stream ends.
    pub ended_at: Option<i64>,
    pub created_at: i64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

// =============================================================================
// Stats
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct StreamManagerStats {
    pub total: usize,
    pub pending: usize,
    pub live: usize,
    pub ended: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TranscoderStats {
    pub active: usize,
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterStats {
    pub connections: usize,
    pub broadcasters: usize,
    pub viewers: usize,
}
