//! Transcoder supervision.
//!
//! Spawns one external encoder process per stream, producing segmented HLS
//! into `{storage_root}/{stream_id}/`. The supervisor enforces a global
//! concurrency cap, probes liveness lazily, and guarantees that a stopped
//! encoder is gone within the grace window: SIGTERM immediately, SIGKILL
//! after three seconds if the process is still alive.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::config::{HlsConfig, TranscodeConfig};
use crate::services::streaming::models::TranscoderStats;

/// Grace period between the termination signal and the forced kill.
const STOP_GRACE: Duration = Duration::from_secs(3);

struct TranscodeHandle {
    child: Child,
    pid: u32,
    started_at: i64,
}

pub struct TranscoderSupervisor {
    hls: HlsConfig,
    transcode: TranscodeConfig,
    processes: Mutex<HashMap<String, TranscodeHandle>>,
}

impl TranscoderSupervisor {
    pub fn new(hls: HlsConfig, transcode: TranscodeConfig) -> Self {
        Self {
            hls,
            transcode,
            processes: Mutex::new(HashMap::new()),
        }
    }

    pub fn stream_dir(&self, stream_id: &str) -> PathBuf {
        self.hls.storage_path.join(stream_id)
    }

    /// Start an encoder for `stream_id` reading from `input_url`.
    ///
    /// Returns false when an encoder already exists for the stream, when the
    /// concurrency cap is reached, or when spawning fails. The output
    /// directory is only created once those checks pass.
    pub async fn start(&self, stream_id: &str, input_url: &str) -> bool {
        if stream_id.contains("..") || stream_id.contains('/') || stream_id.contains('\\') {
            tracing::warn!(stream_id, "refusing transcode for unsafe stream id");
            return false;
        }

        let mut processes = self.processes.lock().await;

        if processes.contains_key(stream_id) {
            tracing::warn!(stream_id, "transcode already running");
            return false;
        }
        if processes.len() >= self.transcode.max_concurrent {
            tracing::warn!(
                stream_id,
                max = self.transcode.max_concurrent,
                "transcode cap reached"
            );
            return false;
        }

        let dir = self.stream_dir(stream_id);
        if let Err(e) = tokio::fs::create_dir_all(&dir).await {
            tracing::error!(stream_id, "failed to create HLS directory: {e}");
            return false;
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = tokio::fs::set_permissions(&dir, std::fs::Permissions::from_mode(0o755)).await;
        }

        let segment_pattern = dir.join("segment_%05d.ts");
        let playlist_path = dir.join("playlist.m3u8");
        let hls_time = self.hls.segment_duration.to_string();
        let hls_list_size = self.hls.playlist_size.to_string();

        tracing::info!(stream_id, input_url, "starting HLS transcode");

        let spawned = Command::new(&self.transcode.ffmpeg_path)
            .args([
                "-hide_banner",
                "-loglevel",
                "warning",
                "-i",
                input_url,
                // Video: H.264 tuned for live latency
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-tune",
                "zerolatency",
                "-crf",
                "23",
                // Audio: AAC 128k / 44.1kHz
                "-c:a",
                "aac",
                "-b:a",
                "128k",
                "-ar",
                "44100",
                // HLS output with a sliding segment window
                "-f",
                "hls",
                "-hls_time",
                hls_time.as_str(),
                "-hls_list_size",
                hls_list_size.as_str(),
                "-hls_flags",
                "delete_segments+append_list",
            ])
            .arg("-hls_segment_filename")
            .arg(&segment_pattern)
            .arg(&playlist_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::error!(stream_id, "failed to spawn encoder: {e}");
                return false;
            }
        };

        let pid = child.id().unwrap_or(0);
        processes.insert(
            stream_id.to_string(),
            TranscodeHandle {
                child,
                pid,
                started_at: chrono::Utc::now().timestamp(),
            },
        );
        tracing::info!(stream_id, pid, "transcode started");
        true
    }

    /// Stop the encoder for `stream_id`.
    ///
    /// The registration is removed immediately; the process gets SIGTERM now
    /// and a forced kill after the grace window if it is still alive.
    pub async fn stop(&self, stream_id: &str) -> bool {
        let handle = {
            let mut processes = self.processes.lock().await;
            processes.remove(stream_id)
        };

        let Some(handle) = handle else {
            return false;
        };

        tracing::info!(stream_id, pid = handle.pid, "stopping transcode");

        #[cfg(unix)]
        unsafe {
            nix::libc::kill(handle.pid as i32, nix::libc::SIGTERM);
        }

        let mut child = handle.child;
        let id = stream_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(STOP_GRACE).await;
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    tracing::warn!(stream_id = %id, "encoder ignored SIGTERM, killing");
                    let _ = child.kill().await;
                }
            }
        });

        true
    }

    /// Whether a live encoder process exists for `stream_id`. A dead
    /// process found by the probe is evicted as a side effect.
    pub async fn is_active(&self, stream_id: &str) -> bool {
        let mut processes = self.processes.lock().await;
        let Some(handle) = processes.get_mut(stream_id) else {
            return false;
        };
        match handle.child.try_wait() {
            Ok(None) => true,
            _ => {
                tracing::warn!(stream_id, pid = handle.pid, "encoder exited, evicting");
                processes.remove(stream_id);
                false
            }
        }
    }

    /// Remove the stream's HLS artifacts and directory. Idempotent.
    pub async fn cleanup(&self, stream_id: &str) -> std::io::Result<()> {
        let dir = self.stream_dir(stream_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn stop_all(&self) {
        let ids: Vec<String> = {
            let processes = self.processes.lock().await;
            processes.keys().cloned().collect()
        };
        for id in ids {
            self.stop(&id).await;
        }
    }

    /// Stream ids with a registered encoder, for the reaper.
    pub async fn registered_ids(&self) -> Vec<String> {
        let processes = self.processes.lock().await;
        processes.keys().cloned().collect()
    }

    pub async fn started_at(&self, stream_id: &str) -> Option<i64> {
        let processes = self.processes.lock().await;
        processes.get(stream_id).map(|h| h.started_at)
    }

    pub async fn stats(&self) -> TranscoderStats {
        let processes = self.processes.lock().await;
        TranscoderStats {
            active: processes.len(),
            max_concurrent: self.transcode.max_concurrent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn supervisor(dir: &TempDir, max: usize, binary: &str) -> TranscoderSupervisor {
        TranscoderSupervisor::new(
            HlsConfig {
                storage_path: dir.path().to_path_buf(),
                segment_duration: 4,
                playlist_size: 5,
            },
            TranscodeConfig {
                max_concurrent: max,
                ffmpeg_path: binary.to_string(),
                reaper_interval_secs: 30,
            },
        )
    }

    #[tokio::test]
    async fn test_start_creates_directory_and_registers() {
        let tmp = TempDir::new().unwrap();
        // `true` ignores the encoder arguments and exits; spawning still
        // succeeds, which is all start() verifies.
        let sup = supervisor(&tmp, 4, "true");

        assert!(sup.start("stream_a", "pipe:0").await);
        assert!(sup.stream_dir("stream_a").is_dir());
        assert_eq!(sup.registered_ids().await, vec!["stream_a"]);
        assert!(sup.started_at("stream_a").await.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_start_refused() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 4, "true");

        assert!(sup.start("stream_a", "pipe:0").await);
        assert!(!sup.start("stream_a", "pipe:0").await);
        assert_eq!(sup.stats().await.active, 1);
    }

    #[tokio::test]
    async fn test_concurrency_cap() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 2, "true");

        assert!(sup.start("stream_a", "pipe:0").await);
        assert!(sup.start("stream_b", "pipe:0").await);
        assert!(!sup.start("stream_c", "pipe:0").await);

        assert_eq!(sup.stats().await.active, 2);
        // The refused start must not create the directory.
        assert!(!sup.stream_dir("stream_c").exists());
    }

    #[tokio::test]
    async fn test_spawn_failure_leaves_no_entry() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 4, "/nonexistent/encoder");

        assert!(!sup.start("stream_a", "pipe:0").await);
        assert_eq!(sup.stats().await.active, 0);
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 4, "true");

        assert!(sup.start("stream_a", "pipe:0").await);
        assert!(sup.stop("stream_a").await);
        assert!(!sup.stop("stream_a").await);
        assert_eq!(sup.stats().await.active, 0);
    }

    #[tokio::test]
    async fn test_is_active_evicts_dead_process() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 4, "true");
        assert!(sup.start("stream_a", "pipe:0").await);

        // The fake encoder exits immediately; poll until the probe notices.
        let mut active = true;
        for _ in 0..50 {
            active = sup.is_active("stream_a").await;
            if !active {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(!active);
        assert_eq!(sup.stats().await.active, 0);
    }

    #[tokio::test]
    async fn test_cleanup_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 4, "true");
        assert!(sup.start("stream_a", "pipe:0").await);

        sup.cleanup("stream_a").await.unwrap();
        assert!(!sup.stream_dir("stream_a").exists());
        sup.cleanup("stream_a").await.unwrap();
    }

    #[tokio::test]
    async fn test_unsafe_stream_id_refused() {
        let tmp = TempDir::new().unwrap();
        let sup = supervisor(&tmp, 4, "true");
        assert!(!sup.start("../escape", "pipe:0").await);
        assert!(!tmp.path().parent().unwrap().join("escape").exists());
    }
}
