use anyhow::{Context, Result};
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Audio,
    Video,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Audio => f.write_str("audio"),
            TrackKind::Video => f.write_str("video"),
        }
    }
}

/// A captured track. Clones share the enabled flag, so toggling is visible to
/// whoever feeds samples into it. A disabled track swallows samples instead of
/// being removed, which keeps the negotiated session untouched.
#[derive(Clone)]
pub struct LocalTrack {
    kind: TrackKind,
    enabled: Arc<AtomicBool>,
    rtc: Arc<TrackLocalStaticSample>,
}

impl LocalTrack {
    pub fn new(kind: TrackKind, stream_id: &str) -> Self {
        let capability = match kind {
            TrackKind::Audio => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48000,
                channels: 2,
                ..Default::default()
            },
            TrackKind::Video => RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                clock_rate: 90000,
                ..Default::default()
            },
        };
        let rtc = Arc::new(TrackLocalStaticSample::new(
            capability,
            kind.to_string(),
            stream_id.to_owned(),
        ));

        Self {
            kind,
            enabled: Arc::new(AtomicBool::new(true)),
            rtc,
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Flips the flag and returns the new value.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn rtc_track(&self) -> Arc<TrackLocalStaticSample> {
        Arc::clone(&self.rtc)
    }

    /// Returns `false` when the sample was discarded because the track is
    /// disabled.
    pub async fn write_sample(&self, data: Bytes, duration: Duration) -> Result<bool> {
        if !self.is_enabled() {
            return Ok(false);
        }
        self.rtc
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await
            .with_context(|| format!("writing {} sample", self.kind))?;
        Ok(true)
    }
}

impl fmt::Debug for LocalTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalTrack")
            .field("kind", &self.kind)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// The audio and video tracks of one participant.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    stream_id: String,
    audio: LocalTrack,
    video: LocalTrack,
}

impl LocalMedia {
    pub fn new(stream_id: impl Into<String>) -> Self {
        let stream_id = stream_id.into();
        Self {
            audio: LocalTrack::new(TrackKind::Audio, &stream_id),
            video: LocalTrack::new(TrackKind::Video, &stream_id),
            stream_id,
        }
    }

    pub fn stream_id(&self) -> &str {
        &self.stream_id
    }

    pub fn audio(&self) -> &LocalTrack {
        &self.audio
    }

    pub fn video(&self) -> &LocalTrack {
        &self.video
    }

    pub fn tracks(&self) -> [&LocalTrack; 2] {
        [&self.audio, &self.video]
    }
}
