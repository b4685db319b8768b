//! WebSocket signaling fabric.
//!
//! - `protocol.rs` - JSON frame types exchanged with clients
//! - `router.rs` - the routing fabric: broadcaster/viewer registries,
//!   SDP/ICE relay, subscription handling and disconnect convergence

pub mod protocol;
pub mod router;

pub use protocol::{SignalIn, SignalOut};
pub use router::{ConnectionId, SignalingRouter};
