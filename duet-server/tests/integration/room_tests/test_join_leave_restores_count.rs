use duet_core::{ConnectionId, RoomId};

use crate::integration::{create_test_registry, init_tracing};

#[test]
fn test_join_then_leave_restores_member_count() {
    init_tracing();

    let (registry, _signaling) = create_test_registry();

    for raw in ["R1", "room-with-dashes", "0b5c8a6e"] {
        let room_id = RoomId::parse(raw).unwrap();

        let before = registry.member_count(&room_id);
        let connection = ConnectionId::new();
        registry.join(&room_id, connection).expect("join failed");
        assert_eq!(registry.member_count(&room_id), before + 1);

        registry.leave(&connection);
        assert_eq!(registry.member_count(&room_id), before);
    }
}

#[test]
fn test_leave_with_a_waiting_peer_keeps_the_room() {
    init_tracing();

    let (registry, _signaling) = create_test_registry();
    let room_id = RoomId::parse("R1").unwrap();
    let a = ConnectionId::new();
    let b = ConnectionId::new();

    registry.join(&room_id, a).unwrap();
    let before = registry.member_count(&room_id);

    registry.join(&room_id, b).unwrap();
    registry.leave(&b);

    assert_eq!(registry.member_count(&room_id), before);
    assert_eq!(registry.members(&room_id), vec![a]);
}

#[test]
fn test_leave_without_join_is_a_no_op() {
    let (registry, signaling) = create_test_registry();

    assert_eq!(registry.leave(&ConnectionId::new()), None);
    assert_eq!(registry.room_count(), 0);
    assert_eq!(signaling.total(), 0);
}
