use crate::negotiator::{DEFAULT_CANDIDATE_QUEUE_CAPACITY, NegotiatorOptions, OverflowPolicy};
use crate::transport::TransportConfig;
use duet_core::CallError;
use std::time::Duration;
use url::Url;

pub const SIGNALING_URL_ENV: &str = "DUET_SIGNALING_URL";

const DEFAULT_CALL_SETUP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP base of the relay. The WebSocket route is derived from it.
    pub signaling_url: Option<Url>,
    pub transport: TransportConfig,
    pub call_setup_timeout: Duration,
    pub candidate_queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: None,
            transport: TransportConfig::default(),
            call_setup_timeout: DEFAULT_CALL_SETUP_TIMEOUT,
            candidate_queue_capacity: DEFAULT_CANDIDATE_QUEUE_CAPACITY,
            overflow_policy: OverflowPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, CallError> {
        let url = std::env::var(SIGNALING_URL_ENV).map_err(|_| {
            CallError::SignalingUnavailable(format!("{SIGNALING_URL_ENV} is not set"))
        })?;
        Self::with_signaling_url(&url)
    }

    pub fn with_signaling_url(url: &str) -> Result<Self, CallError> {
        let url = Url::parse(url).map_err(|e| {
            CallError::SignalingUnavailable(format!("invalid signaling url '{url}': {e}"))
        })?;
        Ok(Self {
            signaling_url: Some(url),
            ..Self::default()
        })
    }

    pub fn signaling_url(&self) -> Result<&Url, CallError> {
        self.signaling_url
            .as_ref()
            .ok_or_else(|| CallError::SignalingUnavailable("no signaling url configured".into()))
    }

    /// `http(s)://host/base` becomes `ws(s)://host/base/ws`.
    pub fn websocket_url(&self) -> Result<Url, CallError> {
        let base = self.signaling_url()?;
        let scheme = match base.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(CallError::SignalingUnavailable(format!(
                    "unsupported signaling scheme '{other}'"
                )));
            }
        };

        let unusable =
            || CallError::SignalingUnavailable(format!("cannot derive websocket url from {base}"));
        let mut url = endpoint_url(base, "ws").ok_or_else(unusable)?;
        url.set_scheme(scheme).map_err(|_| unusable())?;
        Ok(url)
    }

    pub fn negotiator_options(&self) -> NegotiatorOptions {
        NegotiatorOptions {
            candidate_queue_capacity: self.candidate_queue_capacity,
            overflow_policy: self.overflow_policy,
        }
    }
}

/// Appends `segment` to the path of `base`, keeping whatever prefix the relay
/// is mounted under. `None` for urls that cannot carry a path.
pub(crate) fn endpoint_url(base: &Url, segment: &str) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().push(segment);
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}
