use crate::media::TrackKind;
use std::fmt;
use std::sync::Arc;
use tracing::info;
use webrtc::track::track_remote::TrackRemote;

/// A track the remote participant is sending.
#[derive(Clone)]
pub struct RemoteStream {
    pub kind: TrackKind,
    pub track_id: String,
    pub stream_id: String,
    track: Option<Arc<TrackRemote>>,
}

impl RemoteStream {
    pub fn new(kind: TrackKind, track_id: impl Into<String>, stream_id: impl Into<String>) -> Self {
        Self {
            kind,
            track_id: track_id.into(),
            stream_id: stream_id.into(),
            track: None,
        }
    }

    pub fn with_track(mut self, track: Arc<TrackRemote>) -> Self {
        self.track = Some(track);
        self
    }

    /// The underlying RTP track, when backed by a live connection.
    pub fn track(&self) -> Option<&Arc<TrackRemote>> {
        self.track.as_ref()
    }
}

impl fmt::Debug for RemoteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteStream")
            .field("kind", &self.kind)
            .field("track_id", &self.track_id)
            .field("stream_id", &self.stream_id)
            .field("live", &self.track.is_some())
            .finish()
    }
}

impl PartialEq for RemoteStream {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.track_id == other.track_id
            && self.stream_id == other.stream_id
    }
}

pub trait RemoteRenderer: Send {
    fn render(&mut self, stream: RemoteStream);
}

/// Renderer for headless participants: records what arrived.
#[derive(Debug, Default)]
pub struct LogRenderer {
    rendered: Vec<RemoteStream>,
}

impl LogRenderer {
    pub fn rendered(&self) -> &[RemoteStream] {
        &self.rendered
    }
}

impl RemoteRenderer for LogRenderer {
    fn render(&mut self, stream: RemoteStream) {
        info!(
            "Remote {} track {} on stream {}",
            stream.kind, stream.track_id, stream.stream_id
        );
        self.rendered.push(stream);
    }
}
