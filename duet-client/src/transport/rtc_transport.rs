use crate::media::{LocalMedia, RemoteStream, TrackKind};
use crate::negotiator::IceState;
use crate::transport::{PeerTransport, TransportConfig, TransportEvent, TransportFactory};
use anyhow::{Context, Result};
use async_trait::async_trait;
use duet_core::{Candidate, SdpType, SessionDescription, ice_ufrags};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_connection_state::RTCIceConnectionState;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::RTPCodecType;
use webrtc::track::track_local::TrackLocal;

/// webrtc-rs peer connection with the local tracks attached.
pub struct RtcPeerTransport {
    generation: u64,
    peer_connection: Arc<RTCPeerConnection>,
}

impl RtcPeerTransport {
    /// Builds the connection and wires its callbacks into `event_tx`.
    pub async fn new(
        generation: u64,
        config: &TransportConfig,
        media: &LocalMedia,
        event_tx: mpsc::Sender<TransportEvent>,
    ) -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("creating peer connection")?,
        );

        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                Box::pin(async move {
                    info!("Peer connection {} state changed: {}", generation, s);
                })
            },
        ));

        let ice_tx = event_tx.clone();
        let ice_pc = Arc::downgrade(&peer_connection);
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let pc = ice_pc.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let init = match candidate.to_json() {
                    Ok(init) => init,
                    Err(e) => {
                        warn!("Failed to serialize local candidate: {}", e);
                        return;
                    }
                };
                let candidate = Candidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid,
                    sdp_m_line_index: init.sdp_mline_index,
                    username_fragment: match init.username_fragment {
                        Some(ufrag) => Some(ufrag),
                        None => local_ufrag(&pc).await,
                    },
                };
                let _ = tx
                    .send(TransportEvent::LocalCandidate(generation, candidate))
                    .await;
            })
        }));

        let state_tx = event_tx.clone();
        peer_connection.on_ice_connection_state_change(Box::new(
            move |s: RTCIceConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    let Some(state) = ice_state(s) else { return };
                    let _ = tx
                        .send(TransportEvent::IceStateChanged(generation, state))
                        .await;
                })
            },
        ));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    other => {
                        debug!("Ignoring remote track of kind {}", other);
                        return;
                    }
                };
                let stream =
                    RemoteStream::new(kind, track.id(), track.stream_id()).with_track(track);
                let _ = tx
                    .send(TransportEvent::RemoteTrack(generation, stream))
                    .await;
            })
        }));

        for track in media.tracks() {
            peer_connection
                .add_track(track.rtc_track() as Arc<dyn TrackLocal + Send + Sync>)
                .await
                .with_context(|| format!("adding local {} track", track.kind()))?;
        }

        debug!("Peer connection {} ready", generation);
        Ok(Self {
            generation,
            peer_connection,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn release_callbacks(&self) {
        let pc = &self.peer_connection;
        pc.on_peer_connection_state_change(Box::new(|_| Box::pin(async {})));
        pc.on_ice_candidate(Box::new(|_| Box::pin(async {})));
        pc.on_ice_connection_state_change(Box::new(|_| Box::pin(async {})));
        pc.on_track(Box::new(|_, _, _| Box::pin(async {})));
    }
}

/// Lets the peer tell this connection's candidates from a replaced one's.
async fn local_ufrag(pc: &Weak<RTCPeerConnection>) -> Option<String> {
    let local = pc.upgrade()?.local_description().await?;
    ice_ufrags(&local.sdp).next().map(str::to_owned)
}

fn ice_state(state: RTCIceConnectionState) -> Option<IceState> {
    match state {
        RTCIceConnectionState::New => Some(IceState::New),
        RTCIceConnectionState::Checking => Some(IceState::Checking),
        RTCIceConnectionState::Connected | RTCIceConnectionState::Completed => {
            Some(IceState::Connected)
        }
        RTCIceConnectionState::Failed => Some(IceState::Failed),
        RTCIceConnectionState::Disconnected => Some(IceState::Disconnected),
        RTCIceConnectionState::Closed => Some(IceState::Closed),
        _ => None,
    }
}

fn to_rtc(description: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = description.sdp().to_owned();
    let rtc = match description.sdp_type() {
        SdpType::Offer => RTCSessionDescription::offer(sdp)?,
        SdpType::Answer => RTCSessionDescription::answer(sdp)?,
    };
    Ok(rtc)
}

#[async_trait]
impl PeerTransport for RtcPeerTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("creating offer")?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("creating answer")?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await
            .with_context(|| format!("setting local {}", description.sdp_type()))?;
        Ok(())
    }

    async fn set_remote_description(&self, description: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await
            .with_context(|| format!("setting remote {}", description.sdp_type()))?;
        Ok(())
    }

    async fn add_candidate(&self, candidate: &Candidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate.clone(),
            sdp_mid: candidate.sdp_mid.clone(),
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment.clone(),
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("adding remote candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.release_callbacks();
        self.peer_connection
            .close()
            .await
            .context("closing peer connection")?;
        info!("Peer connection {} closed", self.generation);
        Ok(())
    }
}

/// Creates [`RtcPeerTransport`]s from a shared [`TransportConfig`].
#[derive(Debug, Clone, Default)]
pub struct RtcTransportFactory {
    config: TransportConfig,
}

impl RtcTransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl TransportFactory for RtcTransportFactory {
    async fn create(
        &self,
        generation: u64,
        media: &LocalMedia,
        events: mpsc::Sender<TransportEvent>,
    ) -> Result<Box<dyn PeerTransport>> {
        let transport = RtcPeerTransport::new(generation, &self.config, media, events).await?;
        Ok(Box::new(transport))
    }
}
