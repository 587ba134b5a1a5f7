use crate::call::{CallCommand, CallHandle, CallSnapshot};
use crate::config::ClientConfig;
use crate::media::{LocalMedia, MediaSource, RemoteRenderer};
use crate::negotiator::{CandidateOutcome, NegotiationState, NegotiatorOutput, SessionNegotiator};
use crate::signaling::SignalingChannel;
use crate::transport::{TransportEvent, TransportFactory};
use duet_core::{
    CallError, ConnectionId, RawCandidate, RawSessionDescription, RoomId, SignalMessage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

enum Flow {
    Continue,
    Stop,
}

/// Single owner of one participant's call: the signaling channel, the
/// negotiator and the local media. Everything that touches them runs on this
/// loop.
pub struct CallController {
    room_id: RoomId,
    channel: Box<dyn SignalingChannel>,
    media: LocalMedia,
    renderer: Box<dyn RemoteRenderer>,
    negotiator: SessionNegotiator,
    command_rx: mpsc::Receiver<CallCommand>,
    transport_rx: mpsc::Receiver<TransportEvent>,
    state_tx: watch::Sender<CallSnapshot>,
    local_id: Option<ConnectionId>,
    remote_id: Option<ConnectionId>,
    calling: bool,
    setup_timeout: Duration,
    setup_deadline: Option<Instant>,
    last_error: Option<CallError>,
}

impl CallController {
    /// Acquires local media from `source` and then spawns the call. When
    /// capture fails the channel is closed without joining the room.
    pub async fn start(
        room_id: RoomId,
        config: &ClientConfig,
        mut channel: Box<dyn SignalingChannel>,
        source: &dyn MediaSource,
        factory: Arc<dyn TransportFactory>,
        renderer: Box<dyn RemoteRenderer>,
    ) -> Result<(CallHandle, LocalMedia), CallError> {
        let media = match source.acquire().await {
            Ok(media) => media,
            Err(e) => {
                error!("Cannot join room {}: {}", room_id, e);
                channel.close().await;
                return Err(e);
            }
        };

        let handle =
            Self::spawn(room_id, config, channel, media.clone(), factory, renderer).await?;
        Ok((handle, media))
    }

    /// Creates the first transport, asks the relay to join `room_id` and
    /// starts the loop.
    pub async fn spawn(
        room_id: RoomId,
        config: &ClientConfig,
        mut channel: Box<dyn SignalingChannel>,
        media: LocalMedia,
        factory: Arc<dyn TransportFactory>,
        renderer: Box<dyn RemoteRenderer>,
    ) -> Result<CallHandle, CallError> {
        let (transport_tx, transport_rx) = mpsc::channel(256);
        let negotiator = SessionNegotiator::new(
            factory,
            media.clone(),
            transport_tx,
            config.negotiator_options(),
        )
        .await?;

        channel
            .send(SignalMessage::JoinRoom {
                room_id: room_id.clone(),
            })
            .await?;

        let (command_tx, command_rx) = mpsc::channel(32);
        let mut snapshot = CallSnapshot::new(room_id.clone());
        snapshot.microphone_enabled = media.audio().is_enabled();
        snapshot.camera_enabled = media.video().is_enabled();
        let (state_tx, state_rx) = watch::channel(snapshot);

        let controller = Self {
            room_id,
            channel,
            media,
            renderer,
            negotiator,
            command_rx,
            transport_rx,
            state_tx,
            local_id: None,
            remote_id: None,
            calling: false,
            setup_timeout: config.call_setup_timeout,
            setup_deadline: None,
            last_error: None,
        };

        let task = tokio::spawn(controller.run());
        Ok(CallHandle::new(command_tx, state_rx, task))
    }

    async fn run(mut self) {
        info!("Call controller started for room {}", self.room_id);

        loop {
            let deadline = self.setup_deadline;

            let flow = tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => {
                        info!("All call handles dropped, leaving room {}", self.room_id);
                        self.leave().await;
                        Flow::Stop
                    }
                },

                msg = self.channel.recv() => match msg {
                    Some(msg) => self.handle_signal(msg).await,
                    None => {
                        self.record(CallError::SignalingUnavailable(
                            "signaling channel closed".into(),
                        ));
                        self.negotiator.close().await;
                        self.calling = false;
                        Flow::Stop
                    }
                },

                Some(event) = self.transport_rx.recv() => {
                    self.handle_transport_event(event).await;
                    Flow::Continue
                }

                _ = setup_timer(deadline) => {
                    self.on_setup_timeout();
                    Flow::Continue
                }
            };

            self.publish(false);
            if let Flow::Stop = flow {
                break;
            }
        }

        self.publish(true);
        info!("Call controller for room {} finished", self.room_id);
    }

    async fn handle_command(&mut self, cmd: CallCommand) -> Flow {
        match cmd {
            CallCommand::StartCall { reply } => {
                let result = self.start_call().await;
                if let Err(e) = &result {
                    self.record(e.clone());
                }
                let _ = reply.send(result);
            }
            CallCommand::ToggleMicrophone { reply } => {
                let enabled = self.media.audio().toggle();
                info!("Microphone {}", if enabled { "on" } else { "off" });
                let _ = reply.send(enabled);
            }
            CallCommand::ToggleCamera { reply } => {
                let enabled = self.media.video().toggle();
                info!("Camera {}", if enabled { "on" } else { "off" });
                let _ = reply.send(enabled);
            }
            CallCommand::Leave { reply } => {
                self.leave().await;
                let _ = reply.send(());
                return Flow::Stop;
            }
        }
        Flow::Continue
    }

    /// Both ids must be known before offering, otherwise a crossing offer
    /// cannot be tie-broken.
    async fn start_call(&mut self) -> Result<(), CallError> {
        if self.calling {
            return Err(CallError::AlreadyNegotiating);
        }
        if self.local_id.is_none() || self.remote_id.is_none() {
            return Err(CallError::NoRemotePeer);
        }

        let offer = self.negotiator.initiate().await?;
        let sent = self
            .channel
            .send(SignalMessage::Offer {
                room_id: self.room_id.clone(),
                description: Some(offer.to_raw()),
            })
            .await;
        if let Err(e) = sent {
            if let Err(reset) = self.negotiator.reset().await {
                warn!("Could not withdraw unsent offer: {}", reset);
            }
            return Err(e);
        }

        self.calling = true;
        self.setup_deadline = Some(Instant::now() + self.setup_timeout);
        info!("Calling in room {}", self.room_id);
        Ok(())
    }

    async fn leave(&mut self) {
        self.negotiator.close().await;
        if let Err(e) = self
            .channel
            .send(SignalMessage::LeaveRoom {
                room_id: self.room_id.clone(),
            })
            .await
        {
            debug!("Could not send leave-room: {}", e);
        }
        self.channel.close().await;
        self.calling = false;
        self.setup_deadline = None;
        info!("Left room {}", self.room_id);
    }

    async fn handle_signal(&mut self, msg: SignalMessage) -> Flow {
        if let Some(room_id) = msg.room_id()
            && room_id != &self.room_id
        {
            warn!(
                "Dropping {} for room {} (in room {})",
                msg.event_name(),
                room_id,
                self.room_id
            );
            return Flow::Continue;
        }

        match msg {
            SignalMessage::Joined {
                connection_id,
                members,
                ..
            } => {
                info!("Joined room {} as {}", self.room_id, connection_id);
                self.local_id = Some(connection_id);
                self.negotiator.set_local_id(connection_id);
                self.set_remote(members.first().copied());
            }
            SignalMessage::RoomFull { .. } => {
                self.record(CallError::RoomFull);
                self.negotiator.close().await;
                self.channel.close().await;
                self.calling = false;
                return Flow::Stop;
            }
            SignalMessage::UserConnected { connection_id, .. } => {
                info!("{} joined room {}", connection_id, self.room_id);
                self.set_remote(Some(connection_id));
            }
            SignalMessage::UserDisconnected { connection_id, .. } => {
                self.on_user_disconnected(connection_id).await;
            }
            SignalMessage::Offer { description, .. } => {
                self.on_remote_offer(description.as_ref()).await;
            }
            SignalMessage::Answer { description, .. } => {
                self.on_remote_answer(description.as_ref()).await;
            }
            SignalMessage::Candidate { candidate, .. } => {
                self.on_remote_candidate(candidate.as_ref()).await;
            }
            SignalMessage::Error { message } => {
                warn!("Relay reported an error: {}", message);
            }
            other => {
                warn!("Unexpected '{}' from relay", other.event_name());
            }
        }
        Flow::Continue
    }

    fn set_remote(&mut self, remote_id: Option<ConnectionId>) {
        self.remote_id = remote_id;
        self.negotiator.set_remote_id(remote_id);
    }

    async fn on_user_disconnected(&mut self, connection_id: ConnectionId) {
        info!("{} left room {}", connection_id, self.room_id);
        if self.remote_id == Some(connection_id) {
            self.set_remote(None);
        }

        self.calling = false;
        self.setup_deadline = None;
        if self.negotiator.state() != NegotiationState::Idle
            && let Err(e) = self.negotiator.reset().await
        {
            self.record(e);
        }
    }

    async fn on_remote_offer(&mut self, description: Option<&RawSessionDescription>) {
        match self.negotiator.handle_remote_offer(description).await {
            Ok(answer) => {
                self.calling = true;
                self.setup_deadline = None;
                self.send_or_record(SignalMessage::Answer {
                    room_id: self.room_id.clone(),
                    description: Some(answer.to_raw()),
                })
                .await;
            }
            Err(e) => self.record(e),
        }
    }

    async fn on_remote_answer(&mut self, description: Option<&RawSessionDescription>) {
        match self.negotiator.handle_remote_answer(description).await {
            Ok(()) => {
                self.setup_deadline = None;
                info!("Call in room {} negotiated", self.room_id);
            }
            Err(e) => self.record(e),
        }
    }

    async fn on_remote_candidate(&mut self, candidate: Option<&RawCandidate>) {
        match self.negotiator.handle_remote_candidate(candidate).await {
            Ok(CandidateOutcome::Applied) => {}
            Ok(CandidateOutcome::Queued { dropped }) if dropped > 0 => {
                warn!("Candidate queue overflow, {} dropped", dropped);
            }
            Ok(CandidateOutcome::Queued { .. } | CandidateOutcome::Stale) => {}
            Err(e @ CallError::CandidateOverflow { .. }) => {
                self.record(e);
                self.negotiator.close().await;
                self.calling = false;
                self.setup_deadline = None;
            }
            Err(e) => self.record(e),
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match self.negotiator.on_transport_event(event) {
            Some(NegotiatorOutput::SendCandidate(candidate)) => {
                self.send_or_record(SignalMessage::Candidate {
                    room_id: self.room_id.clone(),
                    candidate: Some(candidate.to_raw()),
                })
                .await;
            }
            Some(NegotiatorOutput::Render(stream)) => self.renderer.render(stream),
            None => {}
        }
    }

    fn on_setup_timeout(&mut self) {
        self.setup_deadline = None;
        if self.negotiator.state() != NegotiationState::Stable {
            self.record(CallError::SetupTimeout(self.setup_timeout));
        }
    }

    async fn send_or_record(&mut self, msg: SignalMessage) {
        if let Err(e) = self.channel.send(msg).await {
            self.record(e);
        }
    }

    fn record(&mut self, e: CallError) {
        if e.is_recoverable() {
            warn!("Call in room {}: {}", self.room_id, e);
        } else {
            error!("Call in room {}: {}", self.room_id, e);
        }
        self.last_error = Some(e);
    }

    fn publish(&self, finished: bool) {
        self.state_tx.send_replace(CallSnapshot {
            room_id: self.room_id.clone(),
            local_id: self.local_id,
            remote_id: self.remote_id,
            negotiation: self.negotiator.state(),
            ice: self.negotiator.ice_state(),
            health: self.negotiator.health(),
            calling: self.calling,
            microphone_enabled: self.media.audio().is_enabled(),
            camera_enabled: self.media.video().is_enabled(),
            last_error: self.last_error.clone(),
            finished,
        });
    }
}

async fn setup_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
