use duet_client::{
    ClientConfig, MemoryChannelPeer, MemorySignalingChannel, NegotiationState, OverflowPolicy,
};
use duet_core::{
    CallError, ConnectionId, RawCandidate, RawSessionDescription, RoomId, SdpType, SignalMessage,
};
use std::time::Duration;

use super::wait_until;
use crate::integration::{TestParticipant, init_tracing, room, spawn_participant};
use crate::utils::TransportCall;

/// A participant whose relay is played by the test.
async fn scripted_participant(
    config: &ClientConfig,
) -> (TestParticipant, MemoryChannelPeer, RoomId, ConnectionId) {
    let room_id = room("R1");
    let (channel, mut peer) = MemorySignalingChannel::pair();
    let participant = spawn_participant("A", &room_id, config, channel).await;

    assert_eq!(
        next_sent(&mut peer).await,
        SignalMessage::JoinRoom {
            room_id: room_id.clone()
        }
    );

    let local_id = ConnectionId::new();
    let remote_id = ConnectionId::new();
    peer.to_client
        .send(SignalMessage::Joined {
            room_id: room_id.clone(),
            connection_id: local_id,
            members: vec![remote_id],
        })
        .unwrap();
    wait_until(&participant.call, "joined", |s| s.joined()).await;

    (participant, peer, room_id, remote_id)
}

async fn next_sent(peer: &mut MemoryChannelPeer) -> SignalMessage {
    tokio::time::timeout(Duration::from_secs(5), peer.from_client.recv())
        .await
        .expect("client sent nothing")
        .expect("client channel closed")
}

fn offer(room_id: &RoomId, description: Option<RawSessionDescription>) -> SignalMessage {
    SignalMessage::Offer {
        room_id: room_id.clone(),
        description,
    }
}

fn candidate(room_id: &RoomId, line: &str) -> SignalMessage {
    SignalMessage::Candidate {
        room_id: room_id.clone(),
        candidate: Some(RawCandidate {
            candidate: Some(line.to_owned()),
            ..Default::default()
        }),
    }
}

fn valid_offer() -> Option<RawSessionDescription> {
    Some(RawSessionDescription {
        sdp_type: Some("offer".to_owned()),
        sdp: Some("v=0 offer from B".to_owned()),
    })
}

#[tokio::test]
async fn test_early_candidate_is_applied_after_answer() {
    init_tracing();
    let (a, mut peer, room_id, _) = scripted_participant(&ClientConfig::default()).await;

    a.call.start_call().await.unwrap();
    let sent_offer = next_sent(&mut peer).await;
    assert!(matches!(sent_offer, SignalMessage::Offer { .. }));

    peer.to_client.send(candidate(&room_id, "candidate:b1")).unwrap();
    peer.to_client
        .send(SignalMessage::Answer {
            room_id: room_id.clone(),
            description: Some(RawSessionDescription {
                sdp_type: Some("answer".to_owned()),
                sdp: Some("v=0 answer from B".to_owned()),
            }),
        })
        .unwrap();

    wait_until(&a.call, "stable", |s| s.is_stable()).await;

    assert_eq!(a.transport.applied_candidates(), vec!["candidate:b1".to_owned()]);
    let calls = a.transport.calls_for(1);
    let answer_at = calls
        .iter()
        .position(|c| matches!(c, TransportCall::SetRemote(SdpType::Answer, _)))
        .unwrap();
    let candidate_at = calls
        .iter()
        .position(|c| *c == TransportCall::AddCandidate("candidate:b1".to_owned()))
        .unwrap();
    assert!(answer_at < candidate_at);
}

#[tokio::test]
async fn test_invalid_offer_does_not_end_call() {
    let (a, mut peer, room_id, _) = scripted_participant(&ClientConfig::default()).await;

    peer.to_client.send(offer(&room_id, None)).unwrap();
    let state = wait_until(&a.call, "invalid signal recorded", |s| {
        matches!(s.last_error, Some(CallError::InvalidSignal(_)))
    })
    .await;
    assert_eq!(state.negotiation, NegotiationState::Idle);
    assert!(!state.finished);

    peer.to_client.send(offer(&room_id, valid_offer())).unwrap();
    wait_until(&a.call, "stable", |s| s.is_stable()).await;

    match next_sent(&mut peer).await {
        SignalMessage::Answer {
            room_id: answered_room,
            description,
        } => {
            assert_eq!(answered_room, room_id);
            assert_eq!(description.unwrap().sdp_type.as_deref(), Some("answer"));
        }
        other => panic!("expected an answer, got {other:?}"),
    }
}

#[tokio::test]
async fn test_messages_for_other_rooms_are_dropped() {
    let (a, peer, room_id, _) = scripted_participant(&ClientConfig::default()).await;

    peer.to_client
        .send(offer(&room("OTHER"), valid_offer()))
        .unwrap();
    peer.to_client.send(offer(&room_id, valid_offer())).unwrap();
    wait_until(&a.call, "stable", |s| s.is_stable()).await;

    assert_eq!(a.transport.remote_descriptions().len(), 1);
}

#[tokio::test]
async fn test_lost_signaling_ends_call() {
    let (a, peer, _, _) = scripted_participant(&ClientConfig::default()).await;

    drop(peer);

    let state = wait_until(&a.call, "finished", |s| s.finished).await;
    assert!(matches!(
        state.last_error,
        Some(CallError::SignalingUnavailable(_))
    ));
    assert_eq!(state.negotiation, NegotiationState::Closed);
    assert_eq!(a.transport.close_count(), 1);
}

#[tokio::test]
async fn test_candidate_overflow_closes_call_under_fail_policy() {
    let config = ClientConfig {
        candidate_queue_capacity: 1,
        overflow_policy: OverflowPolicy::FailCall,
        ..ClientConfig::default()
    };
    let (a, peer, room_id, _) = scripted_participant(&config).await;

    peer.to_client.send(candidate(&room_id, "candidate:1")).unwrap();
    peer.to_client.send(candidate(&room_id, "candidate:2")).unwrap();

    let state = wait_until(&a.call, "overflow", |s| s.last_error.is_some()).await;
    assert_eq!(
        state.last_error,
        Some(CallError::CandidateOverflow { capacity: 1 })
    );
    assert_eq!(state.negotiation, NegotiationState::Closed);
    assert!(a.transport.applied_candidates().is_empty());
}

#[tokio::test]
async fn test_leave_room_is_idempotent() {
    let (a, mut peer, room_id, _) = scripted_participant(&ClientConfig::default()).await;

    a.call.leave_room().await.unwrap();
    a.call.leave_room().await.unwrap();

    assert_eq!(
        next_sent(&mut peer).await,
        SignalMessage::LeaveRoom { room_id }
    );
    assert!(peer.from_client.recv().await.is_none());
    assert!(a.call.snapshot().finished);
    assert_eq!(a.transport.close_count(), 1);
}
