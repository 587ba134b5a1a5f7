use crate::media::{LocalMedia, RemoteStream};
use crate::negotiator::{
    CandidateOutcome, CandidateQueue, ConnectionHealth, DEFAULT_CANDIDATE_QUEUE_CAPACITY,
    IceState, NegotiationState, OverflowPolicy,
};
use crate::transport::{PeerTransport, TransportEvent, TransportFactory};
use duet_core::{
    CallError, Candidate, ConnectionId, RawCandidate, RawSessionDescription, SdpType,
    SessionDescription,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatorOptions {
    pub candidate_queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
}

impl Default for NegotiatorOptions {
    fn default() -> Self {
        Self {
            candidate_queue_capacity: DEFAULT_CANDIDATE_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

/// What the owner has to do with a transport event.
#[derive(Debug, Clone, PartialEq)]
pub enum NegotiatorOutput {
    SendCandidate(Candidate),
    Render(RemoteStream),
}

/// Offer/answer state machine for one peer session.
///
/// The negotiator owns the current transport. Leaving `idle` binds the
/// transport to that negotiation; rolling back or resetting closes it and
/// takes a fresh one from the factory under a new generation, so late
/// callbacks from the old connection can be told apart.
pub struct SessionNegotiator {
    factory: Arc<dyn TransportFactory>,
    media: LocalMedia,
    events: mpsc::Sender<TransportEvent>,
    transport: Box<dyn PeerTransport>,
    generation: u64,
    state: NegotiationState,
    ice_state: IceState,
    local_id: Option<ConnectionId>,
    remote_id: Option<ConnectionId>,
    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,
    pending: CandidateQueue,
    applied_candidates: usize,
}

fn transport_error(e: anyhow::Error) -> CallError {
    CallError::Transport(format!("{e:#}"))
}

impl SessionNegotiator {
    pub async fn new(
        factory: Arc<dyn TransportFactory>,
        media: LocalMedia,
        events: mpsc::Sender<TransportEvent>,
        options: NegotiatorOptions,
    ) -> Result<Self, CallError> {
        let generation = 1;
        let transport = factory
            .create(generation, &media, events.clone())
            .await
            .map_err(transport_error)?;

        Ok(Self {
            factory,
            media,
            events,
            transport,
            generation,
            state: NegotiationState::Idle,
            ice_state: IceState::New,
            local_id: None,
            remote_id: None,
            local_description: None,
            remote_description: None,
            pending: CandidateQueue::new(options.candidate_queue_capacity, options.overflow_policy),
            applied_candidates: 0,
        })
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    pub fn ice_state(&self) -> IceState {
        self.ice_state
    }

    pub fn health(&self) -> ConnectionHealth {
        ConnectionHealth::derive(self.state, self.ice_state)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_closed(&self) -> bool {
        self.state == NegotiationState::Closed
    }

    pub fn local_description(&self) -> Option<&SessionDescription> {
        self.local_description.as_ref()
    }

    pub fn remote_description(&self) -> Option<&SessionDescription> {
        self.remote_description.as_ref()
    }

    pub fn applied_candidates(&self) -> usize {
        self.applied_candidates
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending.len()
    }

    pub fn set_local_id(&mut self, id: ConnectionId) {
        self.local_id = Some(id);
    }

    pub fn set_remote_id(&mut self, id: Option<ConnectionId>) {
        self.remote_id = id;
    }

    /// Polite side of the glare tie-break. Unknown ids count as polite.
    pub fn is_polite(&self) -> bool {
        match (&self.local_id, &self.remote_id) {
            (Some(local), Some(remote)) => local.is_polite_towards(remote),
            _ => true,
        }
    }

    pub async fn initiate(&mut self) -> Result<SessionDescription, CallError> {
        match self.state {
            NegotiationState::Idle => {}
            NegotiationState::Closed => return Err(CallError::Closed),
            state => {
                warn!("Refusing to create an offer in state {}", state);
                return Err(CallError::AlreadyNegotiating);
            }
        }

        let offer = self
            .transport
            .create_offer()
            .await
            .map_err(transport_error)?;
        self.transport
            .set_local_description(&offer)
            .await
            .map_err(transport_error)?;

        self.local_description = Some(offer.clone());
        self.transition(NegotiationState::HaveLocalOffer);
        Ok(offer)
    }

    /// Answers `raw`. A polite peer with an offer of its own rolls back by
    /// switching transports; if that fails the local offer stays in place.
    pub async fn handle_remote_offer(
        &mut self,
        raw: Option<&RawSessionDescription>,
    ) -> Result<SessionDescription, CallError> {
        if self.is_closed() {
            return Err(CallError::Closed);
        }
        let offer = SessionDescription::from_raw(raw, SdpType::Offer)?;

        match self.state {
            NegotiationState::Idle => {}
            NegotiationState::HaveLocalOffer if self.is_polite() => {
                info!("Offer collision: rolling back local offer");
                self.replace_transport().await?;
                self.transition(NegotiationState::Idle);
            }
            state => {
                warn!("Ignoring remote offer in state {}", state);
                return Err(CallError::AlreadyNegotiating);
            }
        }

        self.transport
            .set_remote_description(&offer)
            .await
            .map_err(transport_error)?;
        self.remote_description = Some(offer);
        self.transition(NegotiationState::HaveRemoteOffer);

        let answer = match self.answer_remote_offer().await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("Failed to answer remote offer: {}", e);
                // Without a fresh transport there is nothing left to negotiate on.
                if let Err(replace) = self.replace_transport().await {
                    warn!("No transport to fall back to: {}", replace);
                    self.close().await;
                    return Err(replace);
                }
                self.transition(NegotiationState::Idle);
                return Err(e);
            }
        };

        self.local_description = Some(answer.clone());
        self.transition(NegotiationState::Stable);
        self.flush_pending().await;
        Ok(answer)
    }

    async fn answer_remote_offer(&self) -> Result<SessionDescription, CallError> {
        let answer = self
            .transport
            .create_answer()
            .await
            .map_err(transport_error)?;
        self.transport
            .set_local_description(&answer)
            .await
            .map_err(transport_error)?;
        Ok(answer)
    }

    pub async fn handle_remote_answer(
        &mut self,
        raw: Option<&RawSessionDescription>,
    ) -> Result<(), CallError> {
        match self.state {
            NegotiationState::HaveLocalOffer => {}
            NegotiationState::Closed => return Err(CallError::Closed),
            state => {
                warn!("Unexpected answer in state {}", state);
                return Err(CallError::UnexpectedAnswer);
            }
        }
        let answer = SessionDescription::from_raw(raw, SdpType::Answer)?;

        self.transport
            .set_remote_description(&answer)
            .await
            .map_err(transport_error)?;
        self.remote_description = Some(answer);
        self.transition(NegotiationState::Stable);
        self.flush_pending().await;
        Ok(())
    }

    pub async fn handle_remote_candidate(
        &mut self,
        raw: Option<&RawCandidate>,
    ) -> Result<CandidateOutcome, CallError> {
        if self.is_closed() {
            return Err(CallError::Closed);
        }
        let candidate = Candidate::from_raw(raw)?;

        if self.is_stale(&candidate) {
            debug!("Discarding candidate for a replaced remote transport");
            return Ok(CandidateOutcome::Stale);
        }
        if self.remote_description.is_some() {
            self.transport
                .add_candidate(&candidate)
                .await
                .map_err(transport_error)?;
            self.applied_candidates += 1;
            return Ok(CandidateOutcome::Applied);
        }

        let dropped = self.pending.push(candidate)?;
        debug!("Queued remote candidate ({} pending)", self.pending.len());
        Ok(CandidateOutcome::Queued { dropped })
    }

    /// Events from another generation are stale and ignored.
    pub fn on_transport_event(&mut self, event: TransportEvent) -> Option<NegotiatorOutput> {
        if self.is_closed() {
            return None;
        }
        if event.generation() != self.generation {
            debug!(
                "Ignoring event from transport {} (current {})",
                event.generation(),
                self.generation
            );
            return None;
        }

        match event {
            TransportEvent::LocalCandidate(_, candidate) => {
                Some(NegotiatorOutput::SendCandidate(candidate))
            }
            TransportEvent::RemoteTrack(_, stream) => Some(NegotiatorOutput::Render(stream)),
            TransportEvent::IceStateChanged(_, state) => {
                if self.ice_state != state {
                    info!("ICE {} -> {}", self.ice_state, state);
                    self.ice_state = state;
                }
                None
            }
        }
    }

    /// Discards the current session and starts over in `idle` with a fresh
    /// transport. Pending candidates belonged to the old peer and are dropped.
    /// If no transport can be created the session is left as it was.
    pub async fn reset(&mut self) -> Result<(), CallError> {
        if self.is_closed() {
            return Err(CallError::Closed);
        }
        self.replace_transport().await?;
        self.pending.clear();
        self.ice_state = IceState::New;
        self.transition(NegotiationState::Idle);
        Ok(())
    }

    /// Returns `false` if the session was already closed.
    pub async fn close(&mut self) -> bool {
        if self.is_closed() {
            return false;
        }
        self.transition(NegotiationState::Closed);
        self.ice_state = IceState::Closed;
        self.pending.clear();
        self.local_description = None;
        self.remote_description = None;

        if let Err(e) = self.transport.close().await {
            warn!("Transport close failed: {:#}", e);
        }
        true
    }

    /// The old transport is only closed once its successor exists, so a
    /// failed create leaves the negotiator untouched.
    async fn replace_transport(&mut self) -> Result<(), CallError> {
        let generation = self.generation + 1;
        let next = self
            .factory
            .create(generation, &self.media, self.events.clone())
            .await
            .map_err(transport_error)?;

        let previous = std::mem::replace(&mut self.transport, next);
        if let Err(e) = previous.close().await {
            warn!("Transport close failed: {:#}", e);
        }
        self.generation = generation;
        self.local_description = None;
        self.remote_description = None;
        debug!("Switched to transport {}", self.generation);
        Ok(())
    }

    /// A candidate tagged with a ufrag the remote description does not carry
    /// was gathered by a transport the peer has since replaced.
    fn is_stale(&self, candidate: &Candidate) -> bool {
        let (Some(ufrag), Some(remote)) = (&candidate.username_fragment, &self.remote_description)
        else {
            return false;
        };
        let mut ufrags = remote.ice_ufrags().peekable();
        ufrags.peek().is_some() && !ufrags.any(|known| known == ufrag.as_str())
    }

    async fn flush_pending(&mut self) {
        let pending = self.pending.take_all();
        if pending.is_empty() {
            return;
        }
        debug!("Applying {} queued remote candidates", pending.len());

        for candidate in pending {
            if self.is_stale(&candidate) {
                debug!("Discarding queued candidate for a replaced remote transport");
                continue;
            }
            match self.transport.add_candidate(&candidate).await {
                Ok(()) => self.applied_candidates += 1,
                Err(e) => warn!("Queued candidate rejected: {:#}", e),
            }
        }
    }

    fn transition(&mut self, next: NegotiationState) {
        if self.state != next {
            info!("Negotiation {} -> {}", self.state, next);
            self.state = next;
        }
    }
}
