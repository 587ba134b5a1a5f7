use duet_core::{Candidate, ConnectionId, RoomId, SessionDescription, SignalMessage};

use crate::integration::{create_test_registry, init_tracing};

fn offer(room_id: &RoomId) -> SignalMessage {
    SignalMessage::Offer {
        room_id: room_id.clone(),
        description: Some(SessionDescription::offer("v=0").to_raw()),
    }
}

#[test]
fn test_offer_reaches_the_other_member_only() {
    init_tracing();

    let (registry, signaling) = create_test_registry();
    let room_id = RoomId::parse("R1").unwrap();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    registry.join(&room_id, a).unwrap();
    registry.join(&room_id, b).unwrap();

    let recipients = registry.relay(&a, offer(&room_id));

    assert_eq!(recipients, 1);
    assert_eq!(signaling.messages_for(&b), vec![offer(&room_id)]);
    assert_eq!(
        signaling.events_for(&a),
        vec!["user-connected"],
        "the sender never gets its own offer back"
    );
}

#[test]
fn test_relay_to_lonely_room_is_dropped() {
    let (registry, signaling) = create_test_registry();
    let room_id = RoomId::parse("R1").unwrap();
    let a = ConnectionId::new();
    registry.join(&room_id, a).unwrap();

    assert_eq!(registry.relay(&a, offer(&room_id)), 0);
    assert_eq!(signaling.total(), 0);
}

#[test]
fn test_relay_from_non_member_is_dropped() {
    let (registry, signaling) = create_test_registry();
    let room_id = RoomId::parse("R1").unwrap();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    let outsider = ConnectionId::new();
    registry.join(&room_id, a).unwrap();
    registry.join(&room_id, b).unwrap();
    let before = signaling.total();

    assert_eq!(registry.relay(&outsider, offer(&room_id)), 0);
    assert_eq!(
        registry.relay(&a, offer(&RoomId::parse("elsewhere").unwrap())),
        0
    );
    assert_eq!(signaling.total(), before);
}

#[test]
fn test_candidates_keep_sender_order() {
    let (registry, signaling) = create_test_registry();
    let room_id = RoomId::parse("R1").unwrap();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    registry.join(&room_id, a).unwrap();
    registry.join(&room_id, b).unwrap();

    let lines: Vec<String> = (0..5)
        .map(|i| format!("candidate:{i} 1 udp 2122260223 10.0.0.{i} 5000 typ host"))
        .collect();
    for line in &lines {
        registry.relay(
            &b,
            SignalMessage::Candidate {
                room_id: room_id.clone(),
                candidate: Some(Candidate::new(line.clone()).to_raw()),
            },
        );
    }

    let received: Vec<String> = signaling
        .messages_for(&a)
        .into_iter()
        .filter_map(|msg| match msg {
            SignalMessage::Candidate {
                candidate: Some(raw),
                ..
            } => raw.candidate,
            _ => None,
        })
        .collect();
    assert_eq!(received, lines);
}

#[test]
fn test_relay_to_vanished_connection_reports_zero() {
    let (registry, signaling) = create_test_registry();
    let room_id = RoomId::parse("R1").unwrap();
    let a = ConnectionId::new();
    let b = ConnectionId::new();
    registry.join(&room_id, a).unwrap();
    registry.join(&room_id, b).unwrap();

    signaling.disconnect(b);
    assert_eq!(registry.relay(&a, offer(&room_id)), 0);
}
