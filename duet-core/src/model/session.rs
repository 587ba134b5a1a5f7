use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CallError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpType {
    Offer,
    Answer,
}

impl SdpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SdpType::Offer => "offer",
            SdpType::Answer => "answer",
        }
    }
}

impl fmt::Display for SdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated, immutable session description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    sdp_type: SdpType,
    sdp: String,
}

/// `a=ice-ufrag:` values of an SDP blob, session level and per media section.
pub fn ice_ufrags(sdp: &str) -> impl Iterator<Item = &str> {
    sdp.lines()
        .filter_map(|line| line.trim_end().strip_prefix("a=ice-ufrag:"))
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            sdp_type: SdpType::Answer,
            sdp: sdp.into(),
        }
    }

    pub fn sdp_type(&self) -> SdpType {
        self.sdp_type
    }

    pub fn sdp(&self) -> &str {
        &self.sdp
    }

    pub fn ice_ufrags(&self) -> impl Iterator<Item = &str> {
        ice_ufrags(&self.sdp)
    }

    /// Validates a description received from the wire. `raw` is `None` when
    /// the peer sent `null`.
    pub fn from_raw(
        raw: Option<&RawSessionDescription>,
        expected: SdpType,
    ) -> Result<Self, CallError> {
        let raw = raw.ok_or_else(|| {
            CallError::InvalidSignal(format!("{expected} carried no session description"))
        })?;

        let declared = raw
            .sdp_type
            .as_deref()
            .ok_or_else(|| CallError::InvalidSignal(format!("{expected} has no type")))?;
        if declared != expected.as_str() {
            return Err(CallError::InvalidSignal(format!(
                "expected {expected} description, got '{declared}'"
            )));
        }

        match raw.sdp.as_deref() {
            Some(sdp) if !sdp.trim().is_empty() => Ok(Self {
                sdp_type: expected,
                sdp: sdp.to_owned(),
            }),
            _ => Err(CallError::InvalidSignal(format!("{expected} has no sdp"))),
        }
    }

    pub fn to_raw(&self) -> RawSessionDescription {
        RawSessionDescription {
            sdp_type: Some(self.sdp_type.as_str().to_owned()),
            sdp: Some(self.sdp.clone()),
        }
    }
}

/// Session description as it travels over the relay, unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSessionDescription {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub sdp_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp: Option<String>,
}

/// One discovered network path, in `RTCIceCandidateInit` shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_m_line_index: Option<u16>,
    pub username_fragment: Option<String>,
}

impl Candidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }

    pub fn from_raw(raw: Option<&RawCandidate>) -> Result<Self, CallError> {
        let raw =
            raw.ok_or_else(|| CallError::InvalidSignal("candidate payload is null".to_owned()))?;

        match raw.candidate.as_deref() {
            Some(line) if !line.trim().is_empty() => Ok(Self {
                candidate: line.to_owned(),
                sdp_mid: raw.sdp_mid.clone(),
                sdp_m_line_index: raw.sdp_m_line_index,
                username_fragment: raw.username_fragment.clone(),
            }),
            _ => Err(CallError::InvalidSignal(
                "candidate has no candidate line".to_owned(),
            )),
        }
    }

    pub fn to_raw(&self) -> RawCandidate {
        RawCandidate {
            candidate: Some(self.candidate.clone()),
            sdp_mid: self.sdp_mid.clone(),
            sdp_m_line_index: self.sdp_m_line_index,
            username_fragment: self.username_fragment.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(
        rename = "sdpMLineIndex",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}
