use duet_core::{ConnectionId, RoomId, SessionDescription, SignalMessage};
use duet_server::Relay;
use tokio::sync::mpsc;

use crate::integration::init_tracing;

fn drain(rx: &mut mpsc::UnboundedReceiver<SignalMessage>) -> Vec<SignalMessage> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

#[tokio::test]
async fn test_join_is_acknowledged_with_members() {
    init_tracing();

    let relay = Relay::new();
    let room_id = RoomId::parse("R1").unwrap();
    let (a, mut a_rx) = relay.attach();
    let (b, mut b_rx) = relay.attach();

    relay.handle_message(a, SignalMessage::JoinRoom { room_id: room_id.clone() });
    relay.handle_message(b, SignalMessage::JoinRoom { room_id: room_id.clone() });

    assert_eq!(
        drain(&mut a_rx),
        vec![
            SignalMessage::Joined {
                room_id: room_id.clone(),
                connection_id: a,
                members: vec![],
            },
            SignalMessage::UserConnected {
                room_id: room_id.clone(),
                connection_id: b,
            },
        ]
    );
    assert_eq!(
        drain(&mut b_rx),
        vec![SignalMessage::Joined {
            room_id,
            connection_id: b,
            members: vec![a],
        }]
    );
}

#[tokio::test]
async fn test_third_client_gets_room_full() {
    let relay = Relay::new();
    let room_id = RoomId::parse("R1").unwrap();
    let (a, _a_rx) = relay.attach();
    let (b, _b_rx) = relay.attach();
    let (c, mut c_rx) = relay.attach();

    for id in [a, b, c] {
        relay.handle_message(id, SignalMessage::JoinRoom { room_id: room_id.clone() });
    }

    assert_eq!(
        drain(&mut c_rx),
        vec![SignalMessage::RoomFull {
            room_id: room_id.clone()
        }]
    );
    assert_eq!(relay.registry().members(&room_id), vec![a, b]);
}

#[tokio::test]
async fn test_detach_notifies_the_peer() {
    let relay = Relay::new();
    let room_id = RoomId::parse("R1").unwrap();
    let (a, mut a_rx) = relay.attach();
    let (b, _b_rx) = relay.attach();
    relay.handle_message(a, SignalMessage::JoinRoom { room_id: room_id.clone() });
    relay.handle_message(b, SignalMessage::JoinRoom { room_id: room_id.clone() });
    drain(&mut a_rx);

    relay.detach(&b);

    assert_eq!(
        drain(&mut a_rx),
        vec![SignalMessage::UserDisconnected {
            room_id: room_id.clone(),
            connection_id: b,
        }]
    );
    assert!(!relay.signaling().is_attached(&b));
    assert_eq!(relay.registry().members(&room_id), vec![a]);
}

#[tokio::test]
async fn test_offer_is_forwarded_verbatim() {
    let relay = Relay::new();
    let room_id = RoomId::parse("R1").unwrap();
    let (a, _a_rx) = relay.attach();
    let (b, mut b_rx) = relay.attach();
    relay.handle_message(a, SignalMessage::JoinRoom { room_id: room_id.clone() });
    relay.handle_message(b, SignalMessage::JoinRoom { room_id: room_id.clone() });
    drain(&mut b_rx);

    // Malformed descriptions are the clients' problem; the relay does not inspect them.
    let malformed = SignalMessage::Offer {
        room_id: room_id.clone(),
        description: None,
    };
    let valid = SignalMessage::Offer {
        room_id,
        description: Some(SessionDescription::offer("v=0").to_raw()),
    };
    relay.handle_message(a, malformed.clone());
    relay.handle_message(a, valid.clone());

    assert_eq!(drain(&mut b_rx), vec![malformed, valid]);
}

#[tokio::test]
async fn test_relay_only_events_from_clients_are_refused() {
    let relay = Relay::new();
    let (a, mut a_rx) = relay.attach();

    relay.handle_message(
        a,
        SignalMessage::UserConnected {
            room_id: RoomId::parse("R1").unwrap(),
            connection_id: ConnectionId::new(),
        },
    );

    let replies = drain(&mut a_rx);
    assert_eq!(replies.len(), 1);
    assert!(matches!(replies[0], SignalMessage::Error { .. }));
}

#[tokio::test]
async fn test_leave_room_event_detaches_membership_only() {
    let relay = Relay::new();
    let room_id = RoomId::parse("R1").unwrap();
    let (a, _a_rx) = relay.attach();
    relay.handle_message(a, SignalMessage::JoinRoom { room_id: room_id.clone() });

    relay.handle_message(
        a,
        SignalMessage::LeaveRoom {
            room_id: RoomId::parse("other").unwrap(),
        },
    );
    assert_eq!(relay.registry().room_of(&a), Some(room_id.clone()));

    relay.handle_message(a, SignalMessage::LeaveRoom { room_id: room_id.clone() });
    assert_eq!(relay.registry().room_of(&a), None);
    assert!(relay.signaling().is_attached(&a));
}
