use crate::Relay;
use axum::Json;
use axum::extract::State;
use duet_core::RoomCreated;

/// `GET /room`: allocate a fresh room id.
pub async fn create_room(State(relay): State<Relay>) -> Json<RoomCreated> {
    let room_id = relay.registry().create_room();
    Json(RoomCreated { room_id })
}
