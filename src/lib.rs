pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod kv;
pub mod logging;
pub mod security;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use crate::kv::KvStore;
use crate::services::streaming::{
    ChatModerator, SignalingRouter, StreamManager, TranscoderSupervisor, ViewerTracker,
};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub kv: Arc<dyn KvStore>,
    pub streams: Arc<StreamManager>,
    pub viewers: Arc<ViewerTracker>,
    pub chat: Arc<ChatModerator>,
    pub transcoder: Arc<TranscoderSupervisor>,
    pub router: SignalingRouter,
}

impl AppState {
    pub fn new(config: Config, kv: Arc<dyn KvStore>) -> Self {
        let streams = Arc::new(StreamManager::new(
            kv.clone(),
            config.streams.stream_key_ttl,
        ));
        let viewers = Arc::new(ViewerTracker::new(kv.clone()));
        let chat = Arc::new(ChatModerator::new(
            kv.clone(),
            config.chat.max_message_length,
            config.chat.slow_mode_seconds,
        ));
        let transcoder = Arc::new(TranscoderSupervisor::new(
            config.hls.clone(),
            config.transcode.clone(),
        ));
        let router = SignalingRouter::new(streams.clone());

        Self {
            config,
            kv,
            streams,
            viewers,
            chat,
            transcoder,
            router,
        }
    }
}
