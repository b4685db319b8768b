use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub redis: RedisConfig,
    pub hls: HlsConfig,
    pub transcode: TranscodeConfig,
    pub streams: StreamConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_host")]
    pub host: String,

    #[serde(default = "default_app_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// HLS artifact layout and encoder segmentation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct HlsConfig {
    #[serde(default = "default_hls_storage_path")]
    pub storage_path: PathBuf,

    #[serde(default = "default_hls_segment_duration")]
    pub segment_duration: u32,

    #[serde(default = "default_hls_playlist_size")]
    pub playlist_size: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscodeConfig {
    #[serde(default = "default_max_concurrent_transcodes")]
    pub max_concurrent: usize,

    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: String,

    #[serde(default = "default_reaper_interval_secs")]
    pub reaper_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_key_ttl")]
    pub stream_key_ttl: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_slow_mode_seconds")]
    pub slow_mode_seconds: u64,

    #[serde(default = "default_chat_max_message_length")]
    pub max_message_length: usize,
}

// Default value functions
fn default_app_host() -> String {
    "0.0.0.0".to_string()
}

fn default_app_port() -> u16 {
    8080
}

fn default_hls_storage_path() -> PathBuf {
    PathBuf::from("/tmp/fabriq-hls")
}

fn default_hls_segment_duration() -> u32 {
    4
}

fn default_hls_playlist_size() -> u32 {
    5
}

fn default_max_concurrent_transcodes() -> usize {
    4
}

fn default_ffmpeg_path() -> String {
    "/usr/bin/ffmpeg".to_string()
}

fn default_reaper_interval_secs() -> u64 {
    30
}

fn default_stream_key_ttl() -> u64 {
    86_400
}

fn default_chat_slow_mode_seconds() -> u64 {
    0
}

fn default_chat_max_message_length() -> usize {
    500
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let app = AppConfig {
            host: env::var("APP_HOST").unwrap_or_else(|_| default_app_host()),
            port: env_or("APP_PORT", default_app_port()),
        };

        let redis = RedisConfig {
            url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
        };

        let hls = HlsConfig {
            storage_path: env::var("HLS_STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_hls_storage_path()),
            segment_duration: env_or("HLS_SEGMENT_DURATION", default_hls_segment_duration()),
            playlist_size: env_or("HLS_PLAYLIST_SIZE", default_hls_playlist_size()),
        };

        let transcode = TranscodeConfig {
            max_concurrent: env_or(
                "MAX_CONCURRENT_TRANSCODES",
                default_max_concurrent_transcodes(),
            ),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| default_ffmpeg_path()),
            reaper_interval_secs: env_or("REAPER_INTERVAL_SECS", default_reaper_interval_secs()),
        };

        let streams = StreamConfig {
            stream_key_ttl: env_or("STREAM_KEY_TTL", default_stream_key_ttl()),
        };

        let chat = ChatConfig {
            slow_mode_seconds: env_or("CHAT_SLOW_MODE_SECONDS", default_chat_slow_mode_seconds()),
            max_message_length: env_or(
                "CHAT_MAX_MESSAGE_LENGTH",
                default_chat_max_message_length(),
            ),
        };

        Config {
            app,
            redis,
            hls,
            transcode,
            streams,
            chat,
        }
    }
}
