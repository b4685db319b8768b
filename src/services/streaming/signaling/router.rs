//! The signaling routing fabric.
//!
//! Worker-local registries map long-lived WebSocket connections onto
//! streams: at most one broadcaster per stream, an insertion-ordered viewer
//! set per stream, and a reverse map from connection to stream for
//! disconnect cleanup. Outbound frames go through per-connection unbounded
//! senders; a send to a closed connection is silently ignored and the
//! fan-out continues.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::protocol::{error_frame, unknown_type_frame, SignalIn, SignalOut};
use crate::services::streaming::models::RouterStats;
use crate::services::streaming::stream_manager::StreamKeyValidator;

/// Opaque, stable identifier for one accepted WebSocket connection.
/// Minted from a process-wide monotonic counter; serialized as a number in
/// `viewer_fd` / `from_fd` / `target_fd` frame fields.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct ConnectionHandle {
    tenant_id: String,
    user_id: String,
    sender: UnboundedSender<String>,
}

/// The broadcaster registration carries its identity for takeover logging
/// and operator tooling.
#[allow(dead_code)]
struct BroadcasterEntry {
    conn: ConnectionId,
    tenant_id: String,
    user_id: String,
}

#[derive(Default)]
struct RouterState {
    connections: HashMap<ConnectionId, ConnectionHandle>,
    /// stream id -> unique broadcaster on this worker
    broadcasters: HashMap<String, BroadcasterEntry>,
    /// stream id -> viewer connections in subscription order
    viewers: HashMap<String, Vec<ConnectionId>>,
    /// connection -> the stream it is attached to (viewer or broadcaster)
    watching: HashMap<ConnectionId, String>,
}

impl RouterState {
    fn send(&self, conn: ConnectionId, frame: String) {
        if let Some(handle) = self.connections.get(&conn) {
            let _ = handle.sender.send(frame);
        }
    }

    fn is_established(&self, conn: ConnectionId) -> bool {
        self.connections
            .get(&conn)
            .is_some_and(|h| !h.sender.is_closed())
    }
}

#[derive(Clone)]
pub struct SignalingRouter {
    validator: Arc<dyn StreamKeyValidator>,
    state: Arc<RwLock<RouterState>>,
    next_id: Arc<AtomicU64>,
}

impl SignalingRouter {
    pub fn new(validator: Arc<dyn StreamKeyValidator>) -> Self {
        Self {
            validator,
            state: Arc::new(RwLock::new(RouterState::default())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Register a new connection; the receiver yields the frames to push
    /// down the socket.
    pub async fn connect(
        &self,
        tenant_id: &str,
        user_id: &str,
    ) -> (ConnectionId, UnboundedReceiver<String>) {
        let conn = ConnectionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (tx, rx) = unbounded_channel();

        let mut state = self.state.write().await;
        state.connections.insert(
            conn,
            ConnectionHandle {
                tenant_id: tenant_id.to_string(),
                user_id: user_id.to_string(),
                sender: tx,
            },
        );
        tracing::debug!(%conn, tenant_id, user_id, "signaling connection opened");
        (conn, rx)
    }

    /// Converge state after a connection closes: a broadcaster's departure
    /// ends the stream for every viewer, a viewer's departure just removes
    /// it from the set.
    pub async fn disconnect(&self, conn: ConnectionId) {
        let mut state = self.state.write().await;
        state.connections.remove(&conn);

        let Some(stream_id) = state.watching.remove(&conn) else {
            return;
        };

        let is_broadcaster = state
            .broadcasters
            .get(&stream_id)
            .is_some_and(|b| b.conn == conn);

        if is_broadcaster {
            tracing::info!(%conn, %stream_id, "broadcaster disconnected, ending stream");
            let ended = SignalOut::StreamEnded {
                stream_id: stream_id.clone(),
            }
            .to_json();
            for viewer in state.viewers.remove(&stream_id).unwrap_or_default() {
                state.send(viewer, ended.clone());
            }
            state.broadcasters.remove(&stream_id);
        } else if let Some(viewers) = state.viewers.get_mut(&stream_id) {
            viewers.retain(|v| *v != conn);
            if viewers.is_empty() && !state.broadcasters.contains_key(&stream_id) {
                state.viewers.remove(&stream_id);
            }
            tracing::debug!(%conn, %stream_id, "viewer disconnected");
        }
    }

    /// Parse and dispatch one inbound frame from `conn`.
    pub async fn handle_frame(&self, conn: ConnectionId, text: &str) {
        let value: Value = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                let state = self.state.read().await;
                state.send(conn, error_frame("Invalid JSON"));
                return;
            }
        };

        let frame_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        match frame_type.as_str() {
            "offer" | "answer" | "candidate" | "subscribe" => {
                match serde_json::from_value::<SignalIn>(value) {
                    Ok(frame) => self.dispatch(conn, frame).await,
                    Err(_) => {
                        let state = self.state.read().await;
                        state.send(conn, error_frame("Invalid JSON"));
                    }
                }
            }
            _ => {
                let state = self.state.read().await;
                state.send(conn, unknown_type_frame(&frame_type));
            }
        }
    }

    async fn dispatch(&self, conn: ConnectionId, frame: SignalIn) {
        match frame {
            SignalIn::Offer {
                stream_id,
                sdp,
                stream_key,
            } => self.handle_offer(conn, stream_id, sdp, stream_key).await,
            SignalIn::Answer { stream_id, sdp } => self.handle_answer(conn, stream_id, sdp).await,
            SignalIn::Candidate {
                stream_id,
                candidate,
                target_fd,
            } => {
                self.handle_candidate(conn, stream_id, candidate, target_fd)
                    .await
            }
            SignalIn::Subscribe { stream_id } => self.handle_subscribe(conn, stream_id).await,
        }
    }

    async fn handle_offer(
        &self,
        conn: ConnectionId,
        stream_id: String,
        sdp: String,
        stream_key: String,
    ) {
        if stream_id.is_empty() || sdp.is_empty() {
            let state = self.state.read().await;
            state.send(conn, error_frame("Missing stream_id or sdp"));
            return;
        }

        // The key check suspends, so the tenant is captured first and the
        // registries are only touched once the result is in.
        let tenant_id = {
            let state = self.state.read().await;
            match state.connections.get(&conn) {
                Some(handle) => handle.tenant_id.clone(),
                None => return,
            }
        };

        let valid = match self
            .validator
            .validate_stream_key(&tenant_id, &stream_id, &stream_key)
            .await
        {
            Ok(valid) => valid,
            Err(e) => {
                tracing::error!(%conn, %stream_id, "stream key validation failed: {e:#}");
                return;
            }
        };
        if !valid {
            let state = self.state.read().await;
            state.send(conn, error_frame("Invalid stream key"));
            return;
        }

        let mut state = self.state.write().await;
        let Some(handle) = state.connections.get(&conn) else {
            return;
        };
        let user_id = handle.user_id.clone();

        // A connection that was viewing another stream leaves that set
        // before it registers as a broadcaster here.
        if let Some(previous) = state.watching.get(&conn).cloned() {
            if previous != stream_id {
                if let Some(viewers) = state.viewers.get_mut(&previous) {
                    viewers.retain(|v| *v != conn);
                }
            }
        }

        if let Some(prior) = state.broadcasters.get(&stream_id) {
            if prior.conn != conn {
                tracing::warn!(
                    %stream_id,
                    old = %prior.conn,
                    new = %conn,
                    "broadcaster takeover"
                );
            }
        }
        state.broadcasters.insert(
            stream_id.clone(),
            BroadcasterEntry {
                conn,
                tenant_id,
                user_id,
            },
        );
        state.viewers.entry(stream_id.clone()).or_default();
        // The broadcaster never sits in its own viewer set.
        if let Some(viewers) = state.viewers.get_mut(&stream_id) {
            viewers.retain(|v| *v != conn);
        }
        state.watching.insert(conn, stream_id.clone());

        state.send(
            conn,
            SignalOut::BroadcastStarted {
                stream_id: stream_id.clone(),
            }
            .to_json(),
        );

        let offer = SignalOut::Offer {
            stream_id: stream_id.clone(),
            sdp,
        }
        .to_json();
        let viewers = state.viewers.get(&stream_id).cloned().unwrap_or_default();
        for viewer in viewers {
            if state.is_established(viewer) {
                state.send(viewer, offer.clone());
            }
        }
    }

    async fn handle_answer(&self, conn: ConnectionId, stream_id: String, sdp: String) {
        let state = self.state.read().await;
        let Some(broadcaster) = state.broadcasters.get(&stream_id) else {
            state.send(conn, error_frame("Stream not found"));
            return;
        };
        if state.is_established(broadcaster.conn) {
            state.send(
                broadcaster.conn,
                SignalOut::Answer {
                    stream_id,
                    sdp,
                    viewer_fd: conn,
                }
                .to_json(),
            );
        }
    }

    /// ICE relay is best-effort: malformed frames are dropped without a
    /// response and per-connection send failures are ignored.
    async fn handle_candidate(
        &self,
        conn: ConnectionId,
        stream_id: String,
        candidate: Value,
        target_fd: Option<ConnectionId>,
    ) {
        if stream_id.is_empty() || candidate.is_null() {
            return;
        }

        let state = self.state.read().await;
        let frame = SignalOut::Candidate {
            stream_id: stream_id.clone(),
            candidate,
            from_fd: conn,
        }
        .to_json();

        if let Some(target) = target_fd {
            if state.is_established(target) {
                state.send(target, frame);
            }
            return;
        }

        let broadcaster = state.broadcasters.get(&stream_id);
        if broadcaster.is_some_and(|b| b.conn == conn) {
            for viewer in state.viewers.get(&stream_id).into_iter().flatten() {
                if state.is_established(*viewer) {
                    state.send(*viewer, frame.clone());
                }
            }
        } else if let Some(broadcaster) = broadcaster {
            if state.is_established(broadcaster.conn) {
                state.send(broadcaster.conn, frame);
            }
        }
    }

    async fn handle_subscribe(&self, conn: ConnectionId, stream_id: String) {
        if stream_id.is_empty() {
            let state = self.state.read().await;
            state.send(conn, error_frame("Missing stream_id"));
            return;
        }

        let mut state = self.state.write().await;
        if !state.connections.contains_key(&conn) {
            return;
        }

        // Re-subscribing to a different stream moves the connection.
        if let Some(previous) = state.watching.get(&conn).cloned() {
            if previous != stream_id {
                if let Some(viewers) = state.viewers.get_mut(&previous) {
                    viewers.retain(|v| *v != conn);
                }
            }
        }

        let is_own_broadcast = state
            .broadcasters
            .get(&stream_id)
            .is_some_and(|b| b.conn == conn);
        if !is_own_broadcast {
            let viewers = state.viewers.entry(stream_id.clone()).or_default();
            if !viewers.contains(&conn) {
                viewers.push(conn);
            }
            state.watching.insert(conn, stream_id.clone());
        }

        match state.broadcasters.get(&stream_id) {
            Some(broadcaster) => {
                let broadcaster_conn = broadcaster.conn;
                state.send(
                    conn,
                    SignalOut::StreamActive {
                        stream_id: stream_id.clone(),
                    }
                    .to_json(),
                );
                if state.is_established(broadcaster_conn) {
                    state.send(
                        broadcaster_conn,
                        SignalOut::ViewerJoined {
                            stream_id,
                            viewer_fd: conn,
                        }
                        .to_json(),
                    );
                }
            }
            None => {
                state.send(conn, SignalOut::StreamWaiting { stream_id }.to_json());
            }
        }
    }

    pub async fn stats(&self) -> RouterStats {
        let state = self.state.read().await;
        RouterStats {
            connections: state.connections.len(),
            broadcasters: state.broadcasters.len(),
            viewers: state.viewers.values().map(Vec::len).sum(),
        }
    }

    /// Test-facing probe: whether any registration still references `conn`.
    pub async fn has_trace_of(&self, conn: ConnectionId) -> bool {
        let state = self.state.read().await;
        state.connections.contains_key(&conn)
            || state.watching.contains_key(&conn)
            || state.broadcasters.values().any(|b| b.conn == conn)
            || state.viewers.values().any(|vs| vs.contains(&conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;

    struct StaticValidator {
        key: String,
    }

    #[async_trait]
    impl StreamKeyValidator for StaticValidator {
        async fn validate_stream_key(
            &self,
            _tenant_id: &str,
            _stream_id: &str,
            stream_key: &str,
        ) -> Result<bool> {
            Ok(!stream_key.is_empty() && stream_key == self.key)
        }
    }

    fn router(key: &str) -> SignalingRouter {
        SignalingRouter::new(Arc::new(StaticValidator {
            key: key.to_string(),
        }))
    }

    fn next_json(rx: &mut UnboundedReceiver<String>) -> Value {
        let raw = rx.try_recv().expect("expected a frame");
        serde_json::from_str(&raw).unwrap()
    }

    fn assert_empty(rx: &mut UnboundedReceiver<String>) {
        assert!(rx.try_recv().is_err(), "expected no further frames");
    }

    #[tokio::test]
    async fn test_offer_requires_stream_id_and_sdp() {
        let router = router("sk_k");
        let (conn, mut rx) = router.connect("t", "u").await;

        router
            .handle_frame(conn, r#"{"type":"offer","stream_id":"","sdp":""}"#)
            .await;
        let frame = next_json(&mut rx);
        assert_eq!(frame["error"], "Missing stream_id or sdp");
    }

    #[tokio::test]
    async fn test_offer_with_bad_key_rejected_without_state() {
        let router = router("sk_good");
        let (b, mut b_rx) = router.connect("t", "u").await;

        router
            .handle_frame(
                b,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_wrong"}"#,
            )
            .await;
        assert_eq!(next_json(&mut b_rx)["error"], "Invalid stream key");

        // No broadcaster was recorded, so a subscriber keeps waiting.
        let (v, mut v_rx) = router.connect("t", "viewer").await;
        router
            .handle_frame(v, r#"{"type":"subscribe","stream_id":"stream_a"}"#)
            .await;
        assert_eq!(next_json(&mut v_rx)["type"], "stream_waiting");
    }

    #[tokio::test]
    async fn test_happy_path_offer_subscribe_answer_candidate() {
        let router = router("sk_k");
        let (b, mut b_rx) = router.connect("t", "caster").await;
        let (v1, mut v1_rx) = router.connect("t", "alice").await;
        let (v2, mut v2_rx) = router.connect("t", "bob").await;

        router
            .handle_frame(
                b,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0 base","stream_key":"sk_k"}"#,
            )
            .await;
        let started = next_json(&mut b_rx);
        assert_eq!(started["type"], "broadcast_started");
        assert_eq!(started["stream_id"], "stream_a");

        // Two viewers subscribe and both sides learn about it.
        for v in [v1, v2] {
            router
                .handle_frame(v, r#"{"type":"subscribe","stream_id":"stream_a"}"#)
                .await;
        }
        assert_eq!(next_json(&mut v1_rx)["type"], "stream_active");
        assert_eq!(next_json(&mut v2_rx)["type"], "stream_active");

        let join1 = next_json(&mut b_rx);
        let join2 = next_json(&mut b_rx);
        assert_eq!(join1["type"], "viewer_joined");
        assert_eq!(join2["type"], "viewer_joined");
        assert_ne!(join1["viewer_fd"], join2["viewer_fd"]);

        // Viewer answer is relayed to the broadcaster tagged with its fd.
        router
            .handle_frame(v1, r#"{"type":"answer","stream_id":"stream_a","sdp":"v=0 a"}"#)
            .await;
        let answer = next_json(&mut b_rx);
        assert_eq!(answer["type"], "answer");
        assert_eq!(answer["sdp"], "v=0 a");
        assert_eq!(answer["viewer_fd"], v1.as_u64());

        // Broadcaster candidate without target fans out to all viewers.
        router
            .handle_frame(
                b,
                r#"{"type":"candidate","stream_id":"stream_a","candidate":{"c":1}}"#,
            )
            .await;
        assert_eq!(next_json(&mut v1_rx)["from_fd"], b.as_u64());
        assert_eq!(next_json(&mut v2_rx)["from_fd"], b.as_u64());

        // Viewer candidate goes to the broadcaster only.
        router
            .handle_frame(
                v2,
                r#"{"type":"candidate","stream_id":"stream_a","candidate":{"c":2}}"#,
            )
            .await;
        let cand = next_json(&mut b_rx);
        assert_eq!(cand["from_fd"], v2.as_u64());
        assert_empty(&mut v1_rx);

        // Directed candidate reaches only the addressed connection.
        let directed = format!(
            r#"{{"type":"candidate","stream_id":"stream_a","candidate":{{"c":3}},"target_fd":{}}}"#,
            v1.as_u64()
        );
        router.handle_frame(b, &directed).await;
        assert_eq!(next_json(&mut v1_rx)["from_fd"], b.as_u64());
        assert_empty(&mut v2_rx);
    }

    #[tokio::test]
    async fn test_answer_for_unknown_stream() {
        let router = router("sk_k");
        let (v, mut v_rx) = router.connect("t", "u").await;
        router
            .handle_frame(v, r#"{"type":"answer","stream_id":"stream_x","sdp":"v=0"}"#)
            .await;
        assert_eq!(next_json(&mut v_rx)["error"], "Stream not found");
    }

    #[tokio::test]
    async fn test_malformed_ice_is_dropped_silently() {
        let router = router("sk_k");
        let (c, mut c_rx) = router.connect("t", "u").await;
        router
            .handle_frame(c, r#"{"type":"candidate","stream_id":"stream_a"}"#)
            .await;
        router
            .handle_frame(c, r#"{"type":"candidate","candidate":{"c":1}}"#)
            .await;
        assert_empty(&mut c_rx);
    }

    #[tokio::test]
    async fn test_subscribe_is_deduplicated() {
        let router = router("sk_k");
        let (v, mut v_rx) = router.connect("t", "u").await;

        for _ in 0..3 {
            router
                .handle_frame(v, r#"{"type":"subscribe","stream_id":"stream_a"}"#)
                .await;
            assert_eq!(next_json(&mut v_rx)["type"], "stream_waiting");
        }
        assert_eq!(router.stats().await.viewers, 1);
    }

    #[tokio::test]
    async fn test_broadcaster_disconnect_cascade() {
        let router = router("sk_k");
        let (b, mut b_rx) = router.connect("t", "caster").await;
        let (v1, mut v1_rx) = router.connect("t", "alice").await;
        let (v2, mut v2_rx) = router.connect("t", "bob").await;

        router
            .handle_frame(
                b,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_k"}"#,
            )
            .await;
        for v in [v1, v2] {
            router
                .handle_frame(v, r#"{"type":"subscribe","stream_id":"stream_a"}"#)
                .await;
        }
        // Drain handshake frames.
        while b_rx.try_recv().is_ok() {}
        while v1_rx.try_recv().is_ok() {}
        while v2_rx.try_recv().is_ok() {}

        router.disconnect(b).await;

        for rx in [&mut v1_rx, &mut v2_rx] {
            let ended = next_json(rx);
            assert_eq!(ended["type"], "stream_ended");
            assert_eq!(ended["stream_id"], "stream_a");
        }

        let stats = router.stats().await;
        assert_eq!(stats.broadcasters, 0);
        assert_eq!(stats.viewers, 0);
        assert!(!router.has_trace_of(b).await);
    }

    #[tokio::test]
    async fn test_viewer_disconnect_leaves_no_trace() {
        let router = router("sk_k");
        let (b, _b_rx) = router.connect("t", "caster").await;
        let (v, _v_rx) = router.connect("t", "alice").await;

        router
            .handle_frame(
                b,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_k"}"#,
            )
            .await;
        router
            .handle_frame(v, r#"{"type":"subscribe","stream_id":"stream_a"}"#)
            .await;

        router.disconnect(v).await;
        assert!(!router.has_trace_of(v).await);
        // The broadcaster is untouched.
        assert_eq!(router.stats().await.broadcasters, 1);
    }

    #[tokio::test]
    async fn test_broadcaster_takeover_replaces_registration() {
        let router = router("sk_k");
        let (b1, _b1_rx) = router.connect("t", "caster").await;
        let (b2, mut b2_rx) = router.connect("t", "caster").await;

        for b in [b1, b2] {
            router
                .handle_frame(
                    b,
                    r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_k"}"#,
                )
                .await;
        }
        assert_eq!(next_json(&mut b2_rx)["type"], "broadcast_started");
        assert_eq!(router.stats().await.broadcasters, 1);

        // A viewer joining now reaches the new broadcaster.
        let (v, mut v_rx) = router.connect("t", "alice").await;
        router
            .handle_frame(v, r#"{"type":"subscribe","stream_id":"stream_a"}"#)
            .await;
        assert_eq!(next_json(&mut v_rx)["type"], "stream_active");
        assert_eq!(next_json(&mut b2_rx)["type"], "viewer_joined");
    }

    #[tokio::test]
    async fn test_viewer_turned_broadcaster_leaves_old_viewer_set() {
        let router = router("sk_k");
        let (b, mut b_rx) = router.connect("t", "caster").await;
        let (c, mut c_rx) = router.connect("t", "switcher").await;

        router
            .handle_frame(
                b,
                r#"{"type":"offer","stream_id":"stream_b","sdp":"v=0","stream_key":"sk_k"}"#,
            )
            .await;
        router
            .handle_frame(c, r#"{"type":"subscribe","stream_id":"stream_b"}"#)
            .await;
        assert_eq!(next_json(&mut c_rx)["type"], "stream_active");
        assert_eq!(router.stats().await.viewers, 1);
        while b_rx.try_recv().is_ok() {}

        // The viewer starts its own broadcast on a different stream.
        router
            .handle_frame(
                c,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_k"}"#,
            )
            .await;
        assert_eq!(next_json(&mut c_rx)["type"], "broadcast_started");

        let stats = router.stats().await;
        assert_eq!(stats.broadcasters, 2);
        assert_eq!(stats.viewers, 0, "old viewer registration must be gone");

        // Ending the first stream no longer reaches the departed viewer.
        router.disconnect(b).await;
        assert_empty(&mut c_rx);
    }

    #[tokio::test]
    async fn test_unknown_type_and_invalid_json() {
        let router = router("sk_k");
        let (c, mut c_rx) = router.connect("t", "u").await;

        router.handle_frame(c, r#"{"type":"dance"}"#).await;
        let unknown = next_json(&mut c_rx);
        assert_eq!(unknown["error"], "Unknown signaling type");
        assert_eq!(unknown["type"], "dance");

        router.handle_frame(c, "not json at all").await;
        assert_eq!(next_json(&mut c_rx)["error"], "Invalid JSON");
    }

    #[tokio::test]
    async fn test_stream_id_can_be_reused_after_broadcaster_leaves() {
        let router = router("sk_k");
        let (b1, _rx1) = router.connect("t", "caster").await;
        router
            .handle_frame(
                b1,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_k"}"#,
            )
            .await;
        router.disconnect(b1).await;

        let (b2, mut rx2) = router.connect("t", "caster").await;
        router
            .handle_frame(
                b2,
                r#"{"type":"offer","stream_id":"stream_a","sdp":"v=0","stream_key":"sk_k"}"#,
            )
            .await;
        assert_eq!(next_json(&mut rx2)["type"], "broadcast_started");
    }
}
