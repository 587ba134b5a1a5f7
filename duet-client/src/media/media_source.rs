use crate::media::LocalMedia;
use async_trait::async_trait;
use bytes::Bytes;
use duet_core::CallError;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Opus frame carrying 20 ms of silence.
const OPUS_SILENCE_FRAME: [u8; 3] = [0xf8, 0xff, 0xfe];

/// Acquires the local capture devices.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, CallError>;
}

/// Silent and blank tracks for headless participants.
#[derive(Debug, Clone)]
pub struct SyntheticMediaSource {
    stream_id: String,
}

impl SyntheticMediaSource {
    pub fn new(stream_id: impl Into<String>) -> Self {
        Self {
            stream_id: stream_id.into(),
        }
    }

    /// Feeds silence into the audio track. Abort the handle to stop it.
    pub fn spawn_silence(media: &LocalMedia) -> JoinHandle<()> {
        let track = media.audio().clone();
        let frame = Duration::from_millis(20);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(frame);
            loop {
                ticker.tick().await;
                if let Err(e) = track
                    .write_sample(Bytes::from_static(&OPUS_SILENCE_FRAME), frame)
                    .await
                {
                    debug!("Silence feed stopped: {:#}", e);
                    break;
                }
            }
        })
    }
}

impl Default for SyntheticMediaSource {
    fn default() -> Self {
        Self::new("duet-synthetic")
    }
}

#[async_trait]
impl MediaSource for SyntheticMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, CallError> {
        if self.stream_id.trim().is_empty() {
            return Err(CallError::MediaAcquisitionFailed(
                "synthetic stream needs an id".into(),
            ));
        }
        info!("Using synthetic media ({})", self.stream_id);
        Ok(LocalMedia::new(self.stream_id.clone()))
    }
}
