//! Signaling frame protocol.
//!
//! Every WebSocket frame is a JSON object with a `type` discriminator. SDP
//! and ICE payloads are relayed opaquely; the router never parses them.
//! Error frames are bare `{"error": ...}` objects without a `type` tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::router::ConnectionId;

/// Frames accepted from clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum SignalIn {
    #[serde(rename = "offer")]
    Offer {
        #[serde(default)]
        stream_id: String,
        #[serde(default)]
        sdp: String,
        #[serde(default)]
        stream_key: String,
    },
    #[serde(rename = "answer")]
    Answer {
        #[serde(default)]
        stream_id: String,
        #[serde(default)]
        sdp: String,
    },
    #[serde(rename = "candidate")]
    Candidate {
        #[serde(default)]
        stream_id: String,
        #[serde(default)]
        candidate: Value,
        #[serde(default)]
        target_fd: Option<ConnectionId>,
    },
    #[serde(rename = "subscribe")]
    Subscribe {
        #[serde(default)]
        stream_id: String,
    },
}

/// Frames emitted to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum SignalOut {
    #[serde(rename = "broadcast_started")]
    BroadcastStarted { stream_id: String },
    #[serde(rename = "offer")]
    Offer { stream_id: String, sdp: String },
    #[serde(rename = "answer")]
    Answer {
        stream_id: String,
        sdp: String,
        viewer_fd: ConnectionId,
    },
    #[serde(rename = "candidate")]
    Candidate {
        stream_id: String,
        candidate: Value,
        from_fd: ConnectionId,
    },
    #[serde(rename = "stream_active")]
    StreamActive { stream_id: String },
    #[serde(rename = "stream_waiting")]
    StreamWaiting { stream_id: String },
    #[serde(rename = "viewer_joined")]
    ViewerJoined {
        stream_id: String,
        viewer_fd: ConnectionId,
    },
    #[serde(rename = "stream_ended")]
    StreamEnded { stream_id: String },
}

impl SignalOut {
    pub fn to_json(&self) -> String {
        // The enum contains only serializable fields, this cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Bare error frame sent back to the originating connection.
pub fn error_frame(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}

/// Error frame for an unrecognized `type` value, echoing it back.
pub fn unknown_type_frame(frame_type: &str) -> String {
    serde_json::json!({ "error": "Unknown signaling type", "type": frame_type }).to_string()
}
