use crate::config::endpoint_url;
use duet_core::{RoomCreated, RoomId};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

#[derive(Debug, Error)]
pub enum RoomLookupError {
    #[error("invalid relay url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("room lookup request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("room lookup returned HTTP {0}")]
    Status(StatusCode),

    #[error("expected a JSON response but got '{content_type}': {body}")]
    NotJson { content_type: String, body: String },

    #[error("room lookup response is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Asks the relay at `base` for a fresh room id.
pub async fn lookup_room(base: &Url) -> Result<RoomId, RoomLookupError> {
    let url = endpoint_url(base, "room")
        .ok_or(RoomLookupError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?;
    debug!("Requesting room from {}", url);

    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RoomLookupError::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    let body = response.text().await?;

    if !content_type.contains("application/json") {
        return Err(RoomLookupError::NotJson { content_type, body });
    }

    let created: RoomCreated = serde_json::from_str(&body)?;
    info!("Relay created room {}", created.room_id);
    Ok(created.room_id)
}
