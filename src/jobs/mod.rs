//! Background jobs.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::services::streaming::{StreamManager, TranscoderSupervisor};

/// Periodically probe registered encoders and end the stream of any that
/// died. The probe itself evicts dead registrations; this loop closes the
/// lifecycle loop so a crashed encoder does not leave a stream live.
pub fn spawn_transcode_reaper(
    transcoder: Arc<TranscoderSupervisor>,
    streams: Arc<StreamManager>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
        interval.tick().await; // first tick fires immediately, skip it
        loop {
            interval.tick().await;
            for stream_id in transcoder.registered_ids().await {
                if transcoder.is_active(&stream_id).await {
                    continue;
                }
                tracing::warn!(%stream_id, "encoder died, ending stream");
                match streams.end_stream(&stream_id).await {
                    Ok(true) => {}
                    Ok(false) => {
                        tracing::debug!(%stream_id, "stream already past live, nothing to end")
                    }
                    Err(e) => tracing::error!(%stream_id, "failed to end reaped stream: {e:#}"),
                }
                if let Err(e) = transcoder.cleanup(&stream_id).await {
                    tracing::warn!(%stream_id, "failed to clean HLS artifacts: {e}");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HlsConfig, TranscodeConfig};
    use crate::kv::MemoryKv;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reaper_ends_stream_of_dead_encoder() {
        let tmp = TempDir::new().unwrap();
        let kv = Arc::new(MemoryKv::new());
        let streams = Arc::new(StreamManager::new(kv, 86_400));
        let transcoder = Arc::new(TranscoderSupervisor::new(
            HlsConfig {
                storage_path: tmp.path().to_path_buf(),
                segment_duration: 4,
                playlist_size: 5,
            },
            TranscodeConfig {
                max_concurrent: 4,
                // Exits immediately, simulating an encoder crash.
                ffmpeg_path: "true".to_string(),
                reaper_interval_secs: 1,
            },
        ));

        let (stream_id, _key) = streams
            .create_stream("t", "u", "show", HashMap::new())
            .await
            .unwrap();
        streams.start_stream(&stream_id).await.unwrap();

        // Register under the real stream id so the reaper can match them.
        assert!(transcoder.start(&stream_id, "pipe:0").await);

        let handle = spawn_transcode_reaper(transcoder.clone(), streams.clone(), 1);

        let mut ended = false;
        for _ in 0..100 {
            if streams.get_stream(&stream_id).await.unwrap().status
                == crate::services::streaming::StreamStatus::Ended
            {
                ended = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        handle.abort();

        assert!(ended, "reaper should have ended the stream");
        assert_eq!(transcoder.stats().await.active, 0);
        assert!(!transcoder.stream_dir(&stream_id).exists());
    }
}
