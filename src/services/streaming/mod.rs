//! Live Streaming Orchestrator
//!
//! This module is the signaling and delivery core of the control plane:
//! - Stream lifecycle management (create, start, end) and key issuance
//! - WebSocket signaling between a broadcaster and its viewers
//! - Transcoder supervision (external ffmpeg processes producing HLS)
//! - Viewer presence tracking (KV-backed, TTL expiry)
//! - Chat moderation (bans, word filter, slow mode)
//!
//! ## Architecture Principles
//!
//! 1. **State split**
//!    - Broadcaster/viewer registrations, transcoder handles and stream
//!      records are worker-local.
//!    - Anything siblings or dashboards must observe (active streams,
//!      stream keys, presence, moderation) lives in the shared KV store.
//!
//! 2. **Single writer per stream**
//!    - The worker that created a stream owns its lifecycle; other
//!      workers only read the KV mirror.
//!
//! ## Module Structure
//!
//! - `models.rs` - Stream records, status machine, stats types
//! - `stream_manager.rs` - Lifecycle, key issuance and validation
//! - `signaling/` - WebSocket frame protocol and the routing fabric
//! - `transcoder.rs` - ffmpeg process supervision and HLS artifacts
//! - `viewer_tracker.rs` - KV-backed viewer presence
//! - `chat_moderator.rs` - per-message admission checks

pub mod chat_moderator;
pub mod models;
pub mod signaling;
pub mod stream_manager;
pub mod transcoder;
pub mod viewer_tracker;

pub use chat_moderator::{ChatModerator, ChatVerdict};
pub use models::{StreamManagerStats, StreamRecord, StreamStatus, TranscoderStats};
pub use signaling::{ConnectionId, SignalingRouter};
pub use stream_manager::{StreamKeyValidator, StreamManager};
pub use transcoder::TranscoderSupervisor;
pub use viewer_tracker::{ViewerTracker, VIEWER_TTL_SECS};
