mod room;

use crate::Relay;
use crate::signaling::ws_handler;
use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};

pub use room::create_room;

pub fn router(relay: Relay) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/room", get(create_room))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(relay)
}
