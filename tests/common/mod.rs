use std::path::Path;
use std::sync::Arc;

use fabriq_streaming::config::{
    AppConfig, ChatConfig, Config, HlsConfig, RedisConfig, StreamConfig, TranscodeConfig,
};
use fabriq_streaming::kv::MemoryKv;
use fabriq_streaming::AppState;

/// Config pointed at a throwaway storage root, with an encoder binary that
/// exists everywhere and exits immediately.
pub fn test_config(storage_root: &Path) -> Config {
    Config {
        app: AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        hls: HlsConfig {
            storage_path: storage_root.to_path_buf(),
            segment_duration: 4,
            playlist_size: 5,
        },
        transcode: TranscodeConfig {
            max_concurrent: 4,
            ffmpeg_path: "true".to_string(),
            reaper_interval_secs: 30,
        },
        streams: StreamConfig {
            stream_key_ttl: 86_400,
        },
        chat: ChatConfig {
            slow_mode_seconds: 0,
            max_message_length: 500,
        },
    }
}

/// App state backed by the in-process KV store. The store handle is
/// returned alongside so tests can drive its logical clock.
pub fn test_state(storage_root: &Path) -> (Arc<MemoryKv>, AppState) {
    let kv = Arc::new(MemoryKv::new());
    let state = AppState::new(test_config(storage_root), kv.clone());
    (kv, state)
}
