use crate::model::participant::ParticipantId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
}

/// Session description as browsers serialize `RTCSessionDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

/// Trickle ICE candidate, shaped like `RTCIceCandidate.toJSON()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

impl IceCandidate {
    pub fn new(candidate: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            sdp_mid: None,
            sdp_m_line_index: None,
            username_fragment: None,
        }
    }
}

/// Control message exchanged between participants and the relay.
///
/// Serialized as a flat JSON object discriminated by `type`, e.g.
/// `{"type":"offer","from":"a","to":"b","sdp":{"type":"offer","sdp":"v=0..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Join {
        from: ParticipantId,
    },
    Leave {
        from: ParticipantId,
    },
    Offer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: SessionDescription,
    },
    Answer {
        from: ParticipantId,
        to: ParticipantId,
        sdp: SessionDescription,
    },
    IceCandidate {
        from: ParticipantId,
        to: ParticipantId,
        candidate: IceCandidate,
    },
    /// Sent by the relay to a joiner: every other participant already present.
    Participants {
        participants: Vec<ParticipantId>,
    },
    ParticipantJoined {
        from: ParticipantId,
    },
    ParticipantLeft {
        from: ParticipantId,
    },
    Kick {
        from: ParticipantId,
        to: ParticipantId,
    },
    Kicked {
        from: ParticipantId,
    },
    Mute {
        from: ParticipantId,
        to: ParticipantId,
        muted: bool,
    },
    AudioToggle {
        from: ParticipantId,
        #[serde(rename = "audioEnabled")]
        audio_enabled: bool,
    },
    Error {
        message: String,
    },
}

impl SignalMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Wire name of the variant, as found in the `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Join { .. } => "join",
            Self::Leave { .. } => "leave",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::Participants { .. } => "participants",
            Self::ParticipantJoined { .. } => "participant-joined",
            Self::ParticipantLeft { .. } => "participant-left",
            Self::Kick { .. } => "kick",
            Self::Kicked { .. } => "kicked",
            Self::Mute { .. } => "mute",
            Self::AudioToggle { .. } => "audio-toggle",
            Self::Error { .. } => "error",
        }
    }

    pub fn sender(&self) -> Option<&ParticipantId> {
        match self {
            Self::Join { from }
            | Self::Leave { from }
            | Self::Offer { from, .. }
            | Self::Answer { from, .. }
            | Self::IceCandidate { from, .. }
            | Self::ParticipantJoined { from }
            | Self::ParticipantLeft { from }
            | Self::Kick { from, .. }
            | Self::Kicked { from }
            | Self::Mute { from, .. }
            | Self::AudioToggle { from, .. } => Some(from),
            Self::Participants { .. } | Self::Error { .. } => None,
        }
    }

    pub fn target(&self) -> Option<&ParticipantId> {
        match self {
            Self::Offer { to, .. }
            | Self::Answer { to, .. }
            | Self::IceCandidate { to, .. }
            | Self::Kick { to, .. }
            | Self::Mute { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Messages only the relay may originate.
    pub fn is_server_only(&self) -> bool {
        matches!(
            self,
            Self::Participants { .. }
                | Self::ParticipantJoined { .. }
                | Self::ParticipantLeft { .. }
                | Self::Kicked { .. }
                | Self::Error { .. }
        )
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
